use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::state::AppState;
use super::sync::mutate;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{projected_expiry, DurationExtension, Frequency};
use crate::models::{CollectionInput, ContractRecord};

/// One manual installment, optionally extending the contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCollectionInput {
    pub contract_id: String,
    pub date: String,
    pub amount: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub extension: Option<DurationExtension>,
}

/// Every outstanding installment up to today at the given frequency
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRecurringInput {
    pub contract_id: String,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub extension: Option<DurationExtension>,
}

pub async fn record_collection(
    state: &AppState,
    input: RecordCollectionInput,
) -> LedgerResult<ContractRecord> {
    let RecordCollectionInput {
        contract_id,
        date,
        amount,
        note,
        extension,
    } = input;

    mutate(state, |ledger| {
        ledger.record_collection(&contract_id, CollectionInput { date, amount, note }, extension)
    })
    .await
}

/// Appends a prepared batch in order under a single write
pub async fn record_collections(
    state: &AppState,
    contract_id: &str,
    entries: Vec<CollectionInput>,
    extension: Option<DurationExtension>,
) -> LedgerResult<ContractRecord> {
    mutate(state, |ledger| ledger.record_collections(contract_id, entries, extension)).await
}

/// Installments that [`record_recurring`] would add right now
pub async fn preview_recurring(
    state: &AppState,
    contract_id: &str,
    frequency: Frequency,
) -> LedgerResult<Vec<CollectionInput>> {
    state
        .ledger
        .read()
        .await
        .preview_recurring(contract_id, frequency, Utc::now())
}

pub async fn record_recurring(
    state: &AppState,
    input: RecordRecurringInput,
) -> LedgerResult<ContractRecord> {
    let now = Utc::now();
    mutate(state, |ledger| {
        ledger.record_recurring(&input.contract_id, input.frequency, input.extension, now)
    })
    .await
}

pub async fn remove_collection(
    state: &AppState,
    contract_id: &str,
    entry_id: &str,
) -> LedgerResult<ContractRecord> {
    mutate(state, |ledger| ledger.remove_collection(contract_id, entry_id)).await
}

/// End date (`YYYY-MM-DD`) the contract would have once `extension` is
/// saved, for display before confirming
pub async fn preview_expiry(
    state: &AppState,
    contract_id: &str,
    extension: Option<DurationExtension>,
) -> LedgerResult<Option<String>> {
    let ledger = state.ledger.read().await;
    let record = ledger
        .get(contract_id)
        .ok_or_else(|| LedgerError::ContractNotFound(contract_id.to_string()))?;

    Ok(projected_expiry(record, extension).map(|d| d.format("%Y-%m-%d").to_string()))
}
