//! Caching and retrying wrapper around the CRM proxy client.

use bizprofile_api::{Client, RemoteRecord, UserIdentity};

use crate::cache::MemoryCache;
use crate::dedup::KeyedGate;
use crate::error::ProfileError;
use crate::mapping::NormalizedPatch;
use crate::session::ProfileStore;
use crate::settings::{ClientSettings, RetryConfig};

/// API client wrapper that adds in-memory caching, read retries and
/// de-duplication of concurrent reads.
///
/// Cache hits bypass the network entirely. Concurrent reads for the same
/// user share one request, even with the cache disabled. Saves are sent once
/// and drop that user's cached record.
pub struct ProfileClient {
    inner: Client,
    cache: MemoryCache<RemoteRecord>,
    in_flight: KeyedGate<RemoteRecord>,
    retry: RetryConfig,
}

impl ProfileClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ProfileError> {
        Ok(Self {
            inner: Client::new(&settings.base_url, settings.timeout)?,
            cache: MemoryCache::new(settings.cache_ttl),
            in_flight: KeyedGate::new(),
            retry: settings.retry.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    async fn with_retry<T, F, Fut>(&self, label: &str, mut f: F) -> Result<T, ProfileError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ProfileError>>,
    {
        let cfg = &self.retry;
        let mut attempt = 0usize;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt > cfg.max_retries || !is_retryable(&err) {
                        return Err(err);
                    }
                    let delay = cfg.delay_for_attempt(attempt);
                    tracing::warn!(
                        "{} request failed (attempt {}/{}), retrying in {:.1}s",
                        label,
                        attempt,
                        cfg.max_retries,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Fetches the combined profile record, returning cached results when available.
    pub async fn fetch_profile(&self, identity: &UserIdentity) -> Result<RemoteRecord, ProfileError> {
        let cache_key = identity.cache_key();
        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(cached);
        }

        let mut slot = self.in_flight.acquire(&cache_key).await;
        if let Some(shared) = slot.shared() {
            tracing::debug!("Profile for {} loaded by a concurrent request", identity.email);
            return Ok(shared.clone());
        }

        let record = self
            .with_retry("profile", || async {
                Ok(self.inner.fetch_combined_profile(identity).await?)
            })
            .await?;
        self.cache.set(cache_key, record.clone());
        slot.publish(record.clone());
        Ok(record)
    }

    /// Posts one section. Never retried; the user's cached record is dropped
    /// whether or not the call succeeds.
    pub async fn save_section(
        &self,
        identity: &UserIdentity,
        endpoint: &str,
        account_id: &str,
        payload: &NormalizedPatch,
    ) -> Result<(), ProfileError> {
        let result = self.inner.save_section(endpoint, account_id, payload).await;
        self.cache.invalidate(&identity.cache_key());
        result?;
        Ok(())
    }
}

impl ProfileStore for ProfileClient {
    async fn load_profile(&self, identity: &UserIdentity) -> Result<RemoteRecord, ProfileError> {
        self.fetch_profile(identity).await
    }

    async fn save_section(
        &self,
        identity: &UserIdentity,
        endpoint: &str,
        account_id: &str,
        payload: &NormalizedPatch,
    ) -> Result<(), ProfileError> {
        ProfileClient::save_section(self, identity, endpoint, account_id, payload).await
    }
}

fn is_retryable(err: &ProfileError) -> bool {
    match err {
        ProfileError::Api(api_err) => match api_err {
            bizprofile_api::Error::RequestFailed => true,
            bizprofile_api::Error::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            bizprofile_api::Error::Unsuccessful(_)
            | bizprofile_api::Error::InvalidResponse(_)
            | bizprofile_api::Error::InvalidUrl(_) => false,
        },
        _ => false,
    }
}
