use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::api::{ApiError, Delivery};
use crate::db::{NewSyncHistory, SyncDirection, SyncHistory, SyncStatus};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;
use crate::sync::{reconcile, Reconciliation, SyncAction, SyncEvent};

/// What a fetch did to the local record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RefreshOutcome {
    /// Another fetch was running or no endpoint is configured
    Skipped,
    /// Endpoint answered without a success status
    NoUpdate,
    Unchanged,
    #[serde(rename_all = "camelCase")]
    Replaced { record_count: usize },
}

fn log_attempt(
    state: &AppState,
    direction: SyncDirection,
    action: &str,
    contract_id: Option<&str>,
    status: SyncStatus,
    error_message: Option<String>,
) {
    let entry = NewSyncHistory {
        direction,
        action: action.to_string(),
        contract_id: contract_id.map(str::to_string),
        status,
        error_message,
    };
    if let Err(e) = state.db.record_sync_attempt(&entry) {
        log::warn!("Failed to record sync attempt: {}", e);
    }
}

async fn configured_endpoint(state: &AppState) -> Option<String> {
    state
        .ledger
        .read()
        .await
        .config()
        .endpoint()
        .map(str::to_string)
}

/// Runs a ledger mutation under the write lock, then pushes whatever it
/// queued. The local write is already persisted when the pushes start.
pub(crate) async fn mutate<T, F>(state: &AppState, op: F) -> LedgerResult<T>
where
    F: FnOnce(&mut Ledger) -> LedgerResult<T>,
{
    let (value, outbox) = {
        let mut ledger = state.ledger.write().await;
        let value = op(&mut *ledger)?;
        (value, ledger.take_outbox())
    };

    dispatch_outbox(state, outbox).await;
    Ok(value)
}

/// Pushes actions in order. Each failure is logged, recorded and published;
/// none of them rolls back local state.
pub async fn dispatch_outbox(
    state: &AppState,
    actions: Vec<SyncAction>,
) -> Vec<Result<Delivery, ApiError>> {
    let mut results = Vec::with_capacity(actions.len());
    for action in &actions {
        results.push(push_action(state, action).await);
    }
    results
}

/// Sends one action to the configured endpoint. On delivery the last-sync
/// stamp is refreshed.
pub async fn push_action(state: &AppState, action: &SyncAction) -> Result<Delivery, ApiError> {
    let Some(url) = configured_endpoint(state).await else {
        log_attempt(
            state,
            SyncDirection::Push,
            action.name(),
            Some(action.contract_id()),
            SyncStatus::Skipped,
            Some("endpoint not configured".to_string()),
        );
        return Err(ApiError::NotConfigured);
    };

    let endpoint = state.endpoint_for(&url);
    match endpoint.push(action).await {
        Ok(delivery) => {
            let last_sync = {
                let mut ledger = state.ledger.write().await;
                match ledger.mark_synced() {
                    Ok(stamp) => stamp,
                    Err(e) => {
                        log::warn!("Failed to persist last sync time: {}", e);
                        ledger.last_sync().to_string()
                    }
                }
            };

            log::info!("Pushed {} for {}", action.name(), action.contract_id());
            log_attempt(
                state,
                SyncDirection::Push,
                action.name(),
                Some(action.contract_id()),
                SyncStatus::Success,
                None,
            );
            state.publish(SyncEvent::Pushed {
                action: action.name().to_string(),
                contract_id: action.contract_id().to_string(),
                last_sync,
            });
            Ok(delivery)
        }
        Err(e) => {
            log::error!("Push {} for {} failed: {}", action.name(), action.contract_id(), e);
            log_attempt(
                state,
                SyncDirection::Push,
                action.name(),
                Some(action.contract_id()),
                SyncStatus::Failed,
                Some(e.to_string()),
            );
            state.publish(SyncEvent::Failed {
                direction: "push".to_string(),
                message: e.to_string(),
            });
            Err(e)
        }
    }
}

/// Fetches the remote record set and adopts it wholesale when it differs
/// from the local one. At most one fetch runs at a time; a call made while
/// another is outstanding returns `Skipped`.
pub async fn refresh_from_cloud(state: &AppState) -> LedgerResult<RefreshOutcome> {
    let Some(_guard) = state.begin_fetch() else {
        log::debug!("Fetch already in flight, skipping");
        return Ok(RefreshOutcome::Skipped);
    };
    let Some(url) = configured_endpoint(state).await else {
        return Ok(RefreshOutcome::Skipped);
    };

    let endpoint = state.endpoint_for(&url);
    let remote = match endpoint.fetch_records().await {
        Ok(Some(records)) => records,
        Ok(None) => {
            log::warn!("Endpoint returned a non-success snapshot");
            return Ok(RefreshOutcome::NoUpdate);
        }
        Err(e) => {
            log::error!("Fetch from {} failed: {}", url, e);
            log_attempt(
                state,
                SyncDirection::Pull,
                "fetch",
                None,
                SyncStatus::Failed,
                Some(e.to_string()),
            );
            state.publish(SyncEvent::Failed {
                direction: "pull".to_string(),
                message: e.to_string(),
            });
            return Err(LedgerError::Remote(e));
        }
    };

    let (outcome, record_count) = {
        let mut ledger = state.ledger.write().await;
        let outcome = match reconcile(ledger.records(), remote) {
            Reconciliation::Unchanged => RefreshOutcome::Unchanged,
            Reconciliation::Replaced(records) => {
                let record_count = records.len();
                ledger.replace_records(records)?;
                RefreshOutcome::Replaced { record_count }
            }
        };
        if let Err(e) = ledger.mark_synced() {
            log::warn!("Failed to persist last sync time: {}", e);
        }
        (outcome, ledger.records().len())
    };

    let replaced = matches!(outcome, RefreshOutcome::Replaced { .. });
    // Unchanged polls leave no history row
    if replaced {
        log::info!("Adopted {} records from remote", record_count);
        log_attempt(state, SyncDirection::Pull, "fetch", None, SyncStatus::Success, None);
    }
    state.publish(SyncEvent::Refreshed { replaced, record_count });

    Ok(outcome)
}

pub async fn get_last_sync(state: &AppState) -> String {
    state.ledger.read().await.last_sync().to_string()
}

/// Most recent push/pull attempts first
pub async fn get_sync_history(state: &AppState, limit: Option<u32>) -> LedgerResult<Vec<SyncHistory>> {
    state.db.sync_history(limit.unwrap_or(50))
}

/// Server-rendered print view for an existing contract
pub async fn print_url(state: &AppState, contract_id: &str) -> LedgerResult<String> {
    let url = {
        let ledger = state.ledger.read().await;
        if ledger.get(contract_id).is_none() {
            return Err(LedgerError::ContractNotFound(contract_id.to_string()));
        }
        ledger.config().endpoint().map(str::to_string)
    };
    let url = url.ok_or(ApiError::NotConfigured)?;

    Ok(state.endpoint_for(&url).print_url(contract_id)?)
}
