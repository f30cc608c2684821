//! HTTP client for the business portal's CRM proxy.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::{
    types::{AccountDataResponse, OrgInfoRequest, OrgInfoResponse, RemoteRecord, UserIdentity},
    Error,
};

/// Request timeout used when the caller does not configure one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the CRM proxy.
///
/// One `reqwest::Client` is built up front and reused for every call. The
/// client never retries; callers decide what is safe to repeat.
pub struct Client {
    http: reqwest::Client,
    /// Base URL for the proxy, e.g. `https://proxy.example.com/api/v1`.
    base_api_url: String,
}

impl Client {
    /// Creates a client with an explicit request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            http,
            base_api_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client with the default timeout. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::new(base_url, DEFAULT_TIMEOUT)
    }

    pub fn base_url(&self) -> &str {
        &self.base_api_url
    }

    fn get_url(&self, path: &str) -> Result<Url, Error> {
        Url::parse(format!("{}{}", &self.base_api_url, path).as_str()).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::InvalidUrl(format!("{}{}", &self.base_api_url, path))
        })
    }

    async fn execute<T>(&self, request: reqwest::RequestBuilder) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let resp = request
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach CRM proxy: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str::<T>(body).map_err(|e| {
            let snippet = truncate_body(body);
            tracing::error!("Failed to parse response: {} | body: {}", e, snippet);
            Error::InvalidResponse(e.to_string())
        })
    }

    /// Looks up the organization record for a signed-in user.
    pub async fn fetch_org_info(&self, identity: &UserIdentity) -> Result<OrgInfoResponse, Error> {
        let url = self.get_url("/auth/organization-info")?;
        let body = OrgInfoRequest {
            useremail: &identity.email,
            azureid: &identity.azure_id,
        };
        let resp: OrgInfoResponse = self.execute(self.http.post(url).json(&body)).await?;
        if let Some(message) = resp.failure() {
            tracing::error!("Organization info lookup unsuccessful: {}", message);
            return Err(Error::Unsuccessful(message));
        }
        Ok(resp)
    }

    /// Fetches the account-level data sets. A 404 means no record exists yet
    /// and yields an empty response.
    pub async fn fetch_account_data(&self, account_id: &str) -> Result<AccountDataResponse, Error> {
        let account_id = account_id.trim();
        if account_id.is_empty() {
            return Err(Error::InvalidUrl(
                "account id is required to fetch account data".to_string(),
            ));
        }
        let url = self.get_url(format!("/account-data/{}", account_id).as_str())?;
        match self.execute::<AccountDataResponse>(self.http.get(url)).await {
            Err(Error::HttpStatus { status: 404, .. }) => {
                tracing::debug!("No account data found for {}", account_id);
                Ok(AccountDataResponse::default())
            }
            other => other,
        }
    }

    /// Reads the flat profile record for a user: organization info merged
    /// with the account data sets.
    ///
    /// Organization info is required. Account data is best effort: a failure
    /// there is logged and the organization record is returned on its own.
    pub async fn fetch_combined_profile(
        &self,
        identity: &UserIdentity,
    ) -> Result<RemoteRecord, Error> {
        let org = self.fetch_org_info(identity).await?;
        let account_id = org.account_id().map(str::to_string);
        let mut record = org.organization;

        let Some(account_id) = account_id else {
            tracing::warn!("Organization record has no accountId; skipping account data");
            return Ok(record);
        };

        match self.fetch_account_data(&account_id).await {
            Ok(account) => account.merge_into(&mut record),
            Err(e) => tracing::warn!("Account data fetch non-critical failure: {}", e),
        }
        Ok(record)
    }

    /// Posts one section's payload to its save endpoint.
    ///
    /// The body is `{"account": <id>, ...payload}`; payload keys win on conflict.
    pub async fn save_section(
        &self,
        endpoint: &str,
        account_id: &str,
        payload: &RemoteRecord,
    ) -> Result<Value, Error> {
        let url = self.get_url(endpoint)?;
        let mut body = RemoteRecord::new();
        body.insert("account".to_string(), Value::String(account_id.to_string()));
        body.extend(payload.iter().map(|(k, v)| (k.clone(), v.clone())));
        tracing::debug!("Saving {} fields to {}", payload.len(), endpoint);
        self.execute::<Value>(self.http.post(url).json(&body)).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_bodies() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn truncate_cuts_long_bodies_on_char_boundary() {
        let body = "é".repeat(1500);
        let out = truncate_body(&body);
        assert!(out.ends_with("...[truncated]"));
        assert!(out.len() <= 2000 + "...[truncated]".len());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = Client::with_base_url("https://proxy.example.com/api/v1/").unwrap();
        assert_eq!(client.base_url(), "https://proxy.example.com/api/v1");
        let url = client.get_url("/auth/organization-info").unwrap();
        assert_eq!(
            url.as_str(),
            "https://proxy.example.com/api/v1/auth/organization-info"
        );
    }
}
