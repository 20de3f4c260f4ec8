use serde::{Deserialize, Serialize};

use crate::models::ContractRecord;

/// Write-path message for the spreadsheet endpoint.
///
/// Wire shape: `{"action":"add","record":{..}}`, `{"action":"edit","record":{..}}`
/// or `{"action":"delete","id":".."}`. Unknown actions are rejected on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SyncAction {
    Add { record: ContractRecord },
    Edit { record: ContractRecord },
    Delete { id: String },
}

impl SyncAction {
    pub fn name(&self) -> &'static str {
        match self {
            SyncAction::Add { .. } => "add",
            SyncAction::Edit { .. } => "edit",
            SyncAction::Delete { .. } => "delete",
        }
    }

    pub fn contract_id(&self) -> &str {
        match self {
            SyncAction::Add { record } | SyncAction::Edit { record } => &record.id,
            SyncAction::Delete { id } => id,
        }
    }
}

/// Read-path body: `{"status":"success","records":[..]}`
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSnapshot {
    pub status: String,
    #[serde(default)]
    pub records: Option<Vec<ContractRecord>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RemoteSnapshot {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Records carried by a successful snapshot; a success with no list
    /// means the sheet is empty.
    pub fn into_records(self) -> Option<Vec<ContractRecord>> {
        if self.is_success() {
            Some(self.records.unwrap_or_default())
        } else {
            None
        }
    }
}
