use serde::{Deserialize, Serialize};

use super::RemoteRecord;

/// Envelope returned by `GET /account-data/{accountId}`.
///
/// Section-specific rows live under `data`; every other key is a top-level
/// account attribute.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct AccountDataResponse {
    #[serde(default)]
    pub data: Option<AccountDataSets>,
    #[serde(flatten)]
    pub top_level: RemoteRecord,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccountDataSets {
    #[serde(default)]
    pub product_innovations: Vec<RemoteRecord>,
    #[serde(default)]
    pub sales_marketings: Vec<RemoteRecord>,
}

impl AccountDataResponse {
    /// Merges this response into `record`: top-level attributes first, then
    /// the first product-innovation row, then the first sales-marketing row.
    /// Later sources overwrite earlier keys.
    pub fn merge_into(self, record: &mut RemoteRecord) {
        record.extend(self.top_level);
        if let Some(sets) = self.data {
            if let Some(row) = sets.product_innovations.into_iter().next() {
                record.extend(row);
            }
            if let Some(row) = sets.sales_marketings.into_iter().next() {
                record.extend(row);
            }
        }
    }
}
