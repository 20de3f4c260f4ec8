pub mod api;
pub mod commands;
pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::{GeminiClient, SummaryProvider};
use crate::commands::AppState;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{AppConfig, UpdateConfigInput};
use crate::sync::SyncScheduler;

const DB_FILE: &str = "jomi_ledger.db";

/// A running ledger: shared state plus the background poller
pub struct App {
    pub state: Arc<AppState>,
    pub scheduler: SyncScheduler,
    data_dir: PathBuf,
}

impl App {
    /// Open (or create) the ledger stored under `data_dir` and start polling
    /// if the configuration asks for it. Must be called inside a tokio
    /// runtime.
    pub async fn open(data_dir: impl Into<PathBuf>) -> LedgerResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir).map_err(|e| {
            LedgerError::DatabaseError(format!("Failed to create {}: {}", data_dir.display(), e))
        })?;

        let db_path = data_dir.join(DB_FILE);
        log::info!("Database path: {}", db_path.display());

        let database = match db::Database::new(&db_path.to_string_lossy()) {
            Ok(db) => db,
            Err(e) => {
                log::error!("Database initialization failed: {}", e);
                log::error!(
                    "Backups taken before each migration are in {}; restore the newest one over {} to recover",
                    data_dir.join("backups").display(),
                    DB_FILE
                );
                return Err(e.into());
            }
        };

        let mut state = AppState::new(Arc::new(database));
        match GeminiClient::from_env() {
            Ok(client) => {
                let provider: Arc<dyn SummaryProvider> = Arc::new(client);
                state = state.with_summary_provider(provider);
            }
            Err(e) => log::warn!("Financial summary unavailable: {}", e),
        }

        let state = Arc::new(state);
        let scheduler = SyncScheduler::new(Arc::clone(&state));
        scheduler.start().await;

        Ok(Self {
            state,
            scheduler,
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Persist new settings and restart the poller to match them
    pub async fn update_settings(&self, settings: UpdateConfigInput) -> LedgerResult<AppConfig> {
        let config = commands::update_settings(&self.state, settings).await?;
        self.scheduler.reload().await;
        Ok(config)
    }

    /// Restore a backup and restart the poller for the restored settings
    pub async fn import_backup(&self, json_data: &str) -> LedgerResult<usize> {
        let count = commands::import_backup(&self.state, json_data).await?;
        self.scheduler.reload().await;
        Ok(count)
    }

    pub async fn shutdown(&self) {
        self.scheduler.stop().await;
    }
}
