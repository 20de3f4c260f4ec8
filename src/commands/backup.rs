use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::error::LedgerResult;
use crate::models::{AppConfig, ContractRecord};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    #[serde(default)]
    pub config: AppConfig,
    #[serde(default)]
    pub records: Vec<ContractRecord>,
    pub export_date: String,
    pub version: String,
}

/// Export configuration and every record to pretty JSON
pub async fn export_backup(state: &AppState) -> LedgerResult<String> {
    let ledger = state.ledger.read().await;

    let backup = BackupData {
        config: ledger.config().clone(),
        records: ledger.records().to_vec(),
        export_date: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Ok(serde_json::to_string_pretty(&backup)?)
}

/// Replace configuration and the record set with a backup's content.
/// Nothing is pushed to the remote. Returns the number of records restored.
pub async fn import_backup(state: &AppState, json_data: &str) -> LedgerResult<usize> {
    let backup: BackupData = serde_json::from_str(json_data)?;
    let count = backup.records.len();

    let mut ledger = state.ledger.write().await;
    ledger.replace_config(backup.config)?;
    ledger.replace_records(backup.records)?;

    log::info!(
        "Restored {} records from backup {} ({})",
        count,
        backup.version,
        backup.export_date
    );
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::contracts::{create_contract, get_contracts};
    use crate::commands::settings::get_settings;
    use crate::commands::state::test_support::state_with_fake;
    use crate::error::LedgerError;
    use crate::models::NewContract;

    #[tokio::test]
    async fn test_backup_restores_into_fresh_state() {
        let (source, _fake) = state_with_fake().await;
        create_contract(
            &source,
            NewContract {
                title: "Plot".to_string(),
                amount: 100000.0,
                owner_name: "Owner".to_string(),
                duration: "1 বছর".to_string(),
                contractor_name: "Contractor".to_string(),
                start_date: "2024-01-01".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let json = export_backup(&source).await.unwrap();
        assert!(json.contains("\"exportDate\""));
        assert!(json.contains("\"records\""));

        let (target, fake) = state_with_fake().await;
        assert_eq!(import_backup(&target, &json).await.unwrap(), 1);
        assert_eq!(get_contracts(&target).await, get_contracts(&source).await);
        assert_eq!(get_settings(&target).await, get_settings(&source).await);
        assert!(fake.pushed().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_backup_changes_nothing() {
        let (state, _fake) = state_with_fake().await;
        let before = get_settings(&state).await;

        let err = import_backup(&state, "{not json").await.unwrap_err();
        assert!(matches!(err, LedgerError::SerializationError(_)));
        assert_eq!(get_settings(&state).await, before);
    }
}
