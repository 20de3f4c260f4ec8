use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::state::AppState;
use super::sync::mutate;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{expiry_date, is_expired_at, is_expiring_soon, RecordQuery};
use crate::models::{ContractPatch, ContractRecord, NewContract};

/// A record together with the figures the contract card displays
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractOverview {
    pub record: ContractRecord,
    /// `YYYY-MM-DD`, absent when the start date or duration is unreadable
    pub expiry_date: Option<String>,
    pub expired: bool,
    pub expiring_soon: bool,
    pub total_collected: f64,
}

pub async fn get_contracts(state: &AppState) -> Vec<ContractRecord> {
    state.ledger.read().await.records().to_vec()
}

pub async fn get_contract(state: &AppState, id: &str) -> LedgerResult<ContractRecord> {
    state
        .ledger
        .read()
        .await
        .get(id)
        .cloned()
        .ok_or_else(|| LedgerError::ContractNotFound(id.to_string()))
}

/// Records matching the search text and status filter, in stored order
pub async fn search_contracts(state: &AppState, query: RecordQuery) -> Vec<ContractOverview> {
    let now = Utc::now();
    let ledger = state.ledger.read().await;
    let warning_days = ledger.config().warning_days;

    ledger
        .search(&query, now)
        .into_iter()
        .map(|record| ContractOverview {
            expiry_date: expiry_date(&record).map(|d| d.format("%Y-%m-%d").to_string()),
            expired: is_expired_at(&record, now),
            expiring_soon: is_expiring_soon(&record, now, warning_days),
            total_collected: record.total_collected(),
            record,
        })
        .collect()
}

pub async fn create_contract(state: &AppState, input: NewContract) -> LedgerResult<ContractRecord> {
    mutate(state, |ledger| ledger.create_contract(input)).await
}

pub async fn update_contract(state: &AppState, patch: ContractPatch) -> LedgerResult<ContractRecord> {
    mutate(state, |ledger| ledger.update_contract(patch)).await
}

/// Permanently removes a contract and its collections. The caller is
/// expected to have confirmed with the user.
pub async fn delete_contract(state: &AppState, id: &str) -> LedgerResult<ContractRecord> {
    mutate(state, |ledger| ledger.delete_contract(id)).await
}
