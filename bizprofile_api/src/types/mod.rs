mod account;
pub use self::account::{AccountDataResponse, AccountDataSets};

mod organization;
pub use self::organization::{OrgInfoRequest, OrgInfoResponse};

use serde::{Deserialize, Serialize};

/// A flat CRM record: external field id to raw value.
///
/// Keys that are absent mean "not stored"; a key with a `null` value is an
/// explicit null from the CRM and is kept as such.
pub type RemoteRecord = serde_json::Map<String, serde_json::Value>;

/// The signed-in portal user a profile is read for.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserIdentity {
    pub email: String,
    pub azure_id: String,
}

impl UserIdentity {
    pub fn new(email: impl Into<String>, azure_id: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            azure_id: azure_id.into(),
        }
    }

    /// Stable key used for caching and request de-duplication.
    pub fn cache_key(&self) -> String {
        format!("profile:{}:{}", self.azure_id, self.email.to_lowercase())
    }
}
