use super::state::AppState;
use crate::error::LedgerResult;
use crate::models::{AppConfig, UpdateConfigInput};

pub async fn get_settings(state: &AppState) -> AppConfig {
    state.ledger.read().await.config().clone()
}

/// Applies the provided fields and persists the result. The poll scheduler
/// is not touched here; `App::update_settings` reloads it afterwards.
pub async fn update_settings(state: &AppState, settings: UpdateConfigInput) -> LedgerResult<AppConfig> {
    let config = state.ledger.write().await.update_config(settings)?;
    log::info!(
        "Settings updated (autoSync: {}, liveSync: {}, endpoint set: {})",
        config.auto_sync,
        config.live_sync,
        config.endpoint().is_some()
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Theme;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_settings_persist_across_reload() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let state = AppState::new(db.clone());
        assert_eq!(get_settings(&state).await, AppConfig::default());

        update_settings(
            &state,
            UpdateConfigInput {
                business_name: Some("Rahman Agro".to_string()),
                theme: Some(Theme::Dark),
                profit_percentage: Some(12.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let reloaded = AppState::new(db);
        let config = get_settings(&reloaded).await;
        assert_eq!(config.business_name, "Rahman Agro");
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.profit_percentage, 12.0);
        assert_eq!(config.warning_days, 15);
    }
}
