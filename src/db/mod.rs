pub mod connection;
pub mod migration_runner;
pub mod store;

pub use connection::*;
pub use store::{load_json, save_json, DocumentStore, MemoryStore};
