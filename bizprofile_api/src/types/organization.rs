use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RemoteRecord;

/// Body of `POST /auth/organization-info`.
#[derive(Serialize, Debug)]
pub struct OrgInfoRequest<'a> {
    pub useremail: &'a str,
    pub azureid: &'a str,
}

/// Envelope returned by `POST /auth/organization-info`.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct OrgInfoResponse {
    /// Present on some deployments; anything other than `true` is a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub organization: RemoteRecord,
}

impl OrgInfoResponse {
    /// Returns the failure message when the proxy set `success` to anything but `true`.
    pub fn failure(&self) -> Option<String> {
        match &self.success {
            None | Some(Value::Bool(true)) => None,
            Some(_) => Some(
                self.message
                    .clone()
                    .unwrap_or_else(|| "Failed to retrieve organization info".to_string()),
            ),
        }
    }

    /// The CRM account id that links the user to their company record.
    pub fn account_id(&self) -> Option<&str> {
        self.organization
            .get("accountId")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}
