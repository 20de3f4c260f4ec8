//! Service operations a presentation layer calls. Each takes the shared
//! [`AppState`]; mutations persist locally first and then push to the
//! configured endpoint.

pub mod backup;
pub mod collections;
pub mod contracts;
pub mod settings;
pub mod state;
pub mod stats;
pub mod summary;
pub mod sync;

pub use backup::*;
pub use collections::*;
pub use contracts::*;
pub use settings::*;
pub use state::{AppState, EndpointFactory};
pub use stats::*;
pub use summary::*;
pub use sync::{
    dispatch_outbox, get_last_sync, get_sync_history, print_url, push_action, refresh_from_cloud,
    RefreshOutcome,
};
