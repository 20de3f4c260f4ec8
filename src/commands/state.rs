use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, RwLock};

use crate::api::{SheetClient, SummaryProvider, SyncEndpoint};
use crate::db::{Database, DocumentStore};
use crate::ledger::Ledger;
use crate::sync::SyncEvent;

const EVENT_CAPACITY: usize = 64;

pub type EndpointFactory = Arc<dyn Fn(&str) -> Arc<dyn SyncEndpoint> + Send + Sync>;

/// Shared state behind every command: the ledger (single source of truth),
/// the database for the sync log, and the remote collaborators.
pub struct AppState {
    pub ledger: RwLock<Ledger>,
    pub db: Arc<Database>,
    events: broadcast::Sender<SyncEvent>,
    endpoint_factory: EndpointFactory,
    endpoint: Mutex<Option<Arc<dyn SyncEndpoint>>>,
    summary: Option<Arc<dyn SummaryProvider>>,
    fetch_in_flight: AtomicBool,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        let factory: EndpointFactory =
            Arc::new(|url: &str| Arc::new(SheetClient::new(url)) as Arc<dyn SyncEndpoint>);
        Self::with_endpoint_factory(db, factory)
    }

    pub fn with_endpoint_factory(db: Arc<Database>, endpoint_factory: EndpointFactory) -> Self {
        let store: Arc<dyn DocumentStore> = db.clone();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            ledger: RwLock::new(Ledger::load(store)),
            db,
            events,
            endpoint_factory,
            endpoint: Mutex::new(None),
            summary: None,
            fetch_in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_summary_provider(mut self, provider: Arc<dyn SummaryProvider>) -> Self {
        self.summary = Some(provider);
        self
    }

    pub fn summary_provider(&self) -> Option<Arc<dyn SummaryProvider>> {
        self.summary.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, event: SyncEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Client for `url`, reused while the configured URL stays the same
    pub(crate) fn endpoint_for(&self, url: &str) -> Arc<dyn SyncEndpoint> {
        let mut cached = match self.endpoint.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match cached.as_ref() {
            Some(endpoint) if endpoint.endpoint() == url.trim() => endpoint.clone(),
            _ => {
                let endpoint = (self.endpoint_factory)(url);
                *cached = Some(endpoint.clone());
                endpoint
            }
        }
    }

    /// Claims the single fetch slot; `None` while another fetch is running
    pub(crate) fn begin_fetch(&self) -> Option<FetchGuard<'_>> {
        self.fetch_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FetchGuard { flag: &self.fetch_in_flight })
    }
}

pub(crate) struct FetchGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::{AppState, EndpointFactory};
    use crate::api::{ApiError, Delivery, SyncEndpoint};
    use crate::db::Database;
    use crate::models::{ContractRecord, UpdateConfigInput};
    use crate::sync::SyncAction;

    pub(crate) const TEST_URL: &str = "https://sheet.example.test/exec";

    /// In-process stand-in for the spreadsheet endpoint
    #[derive(Default)]
    pub(crate) struct FakeEndpoint {
        pub pushed: Mutex<Vec<SyncAction>>,
        pub remote: Mutex<Option<Vec<ContractRecord>>>,
        pub fetches: AtomicUsize,
        pub fail: Mutex<bool>,
        pub fetch_delay: Mutex<Option<Duration>>,
    }

    impl FakeEndpoint {
        pub fn set_failing(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }

        pub fn set_remote(&self, records: Option<Vec<ContractRecord>>) {
            *self.remote.lock().unwrap() = records;
        }

        pub fn pushed(&self) -> Vec<SyncAction> {
            self.pushed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SyncEndpoint for FakeEndpoint {
        fn endpoint(&self) -> &str {
            TEST_URL
        }

        async fn push(&self, action: &SyncAction) -> Result<Delivery, ApiError> {
            if *self.fail.lock().unwrap() {
                return Err(ApiError::RemoteStatus { status: 503, message: "down".to_string() });
            }
            self.pushed.lock().unwrap().push(action.clone());
            Ok(Delivery { http_status: 200 })
        }

        async fn fetch_records(&self) -> Result<Option<Vec<ContractRecord>>, ApiError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let delay = *self.fetch_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if *self.fail.lock().unwrap() {
                return Err(ApiError::RemoteStatus { status: 503, message: "down".to_string() });
            }
            Ok(self.remote.lock().unwrap().clone())
        }

        fn print_url(&self, contract_id: &str) -> Result<String, ApiError> {
            Ok(format!("{}?action=print&id={}", TEST_URL, contract_id))
        }
    }

    /// State over an in-memory database with a fake endpoint configured
    pub(crate) async fn state_with_fake() -> (Arc<AppState>, Arc<FakeEndpoint>) {
        let fake = Arc::new(FakeEndpoint::default());
        let shared = fake.clone();
        let factory: EndpointFactory =
            Arc::new(move |_url: &str| shared.clone() as Arc<dyn SyncEndpoint>);

        let db = Arc::new(Database::open_in_memory().unwrap());
        let state = Arc::new(AppState::with_endpoint_factory(db, factory));
        state
            .ledger
            .write()
            .await
            .update_config(UpdateConfigInput {
                google_sheet_url: Some(TEST_URL.to_string()),
                ..Default::default()
            })
            .unwrap();

        (state, fake)
    }
}
