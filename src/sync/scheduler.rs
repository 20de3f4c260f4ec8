use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::commands::{refresh_from_cloud, AppState, RefreshOutcome};

/// Background poller that keeps the local record set in step with the
/// spreadsheet endpoint
#[derive(Clone)]
pub struct SyncScheduler {
    state: Arc<AppState>,
    task: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl SyncScheduler {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            task: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn start(&self) {
        log::info!("Starting background sync scheduler");
        self.reload().await;
    }

    /// Stop the running poller and start a new one if the current
    /// configuration asks for polling
    pub async fn reload(&self) {
        self.stop().await;

        let (enabled, secs) = {
            let ledger = self.state.ledger.read().await;
            let config = ledger.config();
            (config.should_poll(), config.poll_interval_secs.max(1))
        };

        if enabled {
            self.start_with_interval(Duration::from_secs(secs)).await;
        } else {
            log::info!("Live sync disabled or no endpoint configured");
        }
    }

    pub(crate) async fn start_with_interval(&self, period: Duration) {
        log::info!("Polling endpoint every {:?}", period);
        let state = Arc::clone(&self.state);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;

                match refresh_from_cloud(&state).await {
                    Ok(RefreshOutcome::Replaced { record_count }) => {
                        log::info!("Live sync adopted {} remote records", record_count);
                    }
                    Ok(outcome) => log::debug!("Live sync tick: {:?}", outcome),
                    // Already logged and published by the refresh
                    Err(e) => log::debug!("Live sync tick failed: {}", e),
                }
            }
        });

        let mut task = self.task.write().await;
        if let Some(previous) = task.replace(handle) {
            previous.abort();
        }
    }

    pub async fn stop(&self) {
        if let Some(task) = self.task.write().await.take() {
            task.abort();
            log::info!("Sync scheduler stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .read()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}
