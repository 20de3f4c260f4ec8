use serde::{Deserialize, Serialize};

/// Sync notifications for whatever is rendering the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SyncEvent {
    /// An action reached the endpoint (application unconfirmed)
    #[serde(rename_all = "camelCase")]
    Pushed {
        action: String,
        contract_id: String,
        last_sync: String,
    },
    /// A fetch succeeded; `replaced` tells whether the local set changed
    #[serde(rename_all = "camelCase")]
    Refreshed { replaced: bool, record_count: usize },
    #[serde(rename_all = "camelCase")]
    Failed { direction: String, message: String },
}
