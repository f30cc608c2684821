//! Runtime settings for the CRM proxy client, read from the environment.

use std::time::Duration;

use rand::Rng;

use crate::error::ProfileError;

pub const ENV_BASE_URL: &str = "BIZPROFILE_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "BIZPROFILE_TIMEOUT_SECS";
pub const ENV_RETRY_MAX: &str = "BIZPROFILE_RETRY_MAX";
pub const ENV_RETRY_BASE_MS: &str = "BIZPROFILE_RETRY_BASE_MS";
pub const ENV_RETRY_MAX_MS: &str = "BIZPROFILE_RETRY_MAX_MS";
pub const ENV_CACHE_TTL_SECS: &str = "BIZPROFILE_CACHE_TTL_SECS";

/// Backoff policy for reads. Saves are never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env_usize(ENV_RETRY_MAX, defaults.max_retries),
            base_delay_ms: env_u64(ENV_RETRY_BASE_MS, defaults.base_delay_ms),
            max_delay_ms: env_u64(ENV_RETRY_MAX_MS, defaults.max_delay_ms),
        }
    }

    /// Exponential delay for the 1-based `attempt`, capped and jittered by ±20%.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(30) as u32;
        let exp = 1u64 << shift;
        let base = self
            .base_delay_ms
            .saturating_mul(exp)
            .min(self.max_delay_ms);
        let jitter = rand::thread_rng().gen_range(0.8..1.2);
        Duration::from_millis((base as f64 * jitter) as u64)
    }
}

/// Everything needed to build a [`crate::ProfileClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryConfig,
    pub cache_ttl: Duration,
}

impl ClientSettings {
    /// Settings for `base_url` with default timeout, retry and cache TTL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: bizprofile_api::DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
            cache_ttl: Duration::from_secs(300),
        }
    }

    /// Reads settings from `BIZPROFILE_*` variables. The base URL is required.
    pub fn from_env() -> Result<Self, ProfileError> {
        let base_url = std::env::var(ENV_BASE_URL)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ProfileError::InvalidInput(format!(
                    "{} is not set; point it at the CRM proxy, e.g. https://proxy.example.com/api/v1",
                    ENV_BASE_URL
                ))
            })?;
        let defaults = Self::new(base_url);
        Ok(Self {
            timeout: Duration::from_secs(env_u64(ENV_TIMEOUT_SECS, defaults.timeout.as_secs())),
            retry: RetryConfig::from_env(),
            cache_ttl: Duration::from_secs(env_u64(ENV_CACHE_TTL_SECS, defaults.cache_ttl.as_secs())),
            ..defaults
        })
    }

    /// Disables read retries.
    pub fn without_retries(mut self) -> Self {
        self.retry.max_retries = 0;
        self
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<usize>().ok())
        .unwrap_or(default)
}
