//! Contract lifecycle and ledger model: the record set, its mutations and
//! everything derived from it (expiry, statistics, search, recurring
//! installments).

pub mod duration;
pub mod engine;
pub mod expiry;
pub mod filter;
pub mod recurring;
pub mod stats;

pub use duration::{extend_duration, ContractDuration, DurationExtension, DurationUnit};
pub use engine::{default_collection_amount, Ledger, NEVER_SYNCED};
pub use expiry::{expiry_date, is_expired, is_expired_at, is_expiring_soon, projected_expiry};
pub use filter::{filter_records, RecordQuery, StatusFilter};
pub use recurring::{Frequency, RecurringSchedule};
pub use stats::{compute_stats, LedgerStats};
