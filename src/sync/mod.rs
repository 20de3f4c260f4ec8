pub mod envelope;
pub mod events;
pub mod reconcile;
pub mod scheduler;

pub use envelope::{RemoteSnapshot, SyncAction};
pub use events::SyncEvent;
pub use reconcile::{reconcile, Reconciliation};
pub use scheduler::SyncScheduler;
