use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{LedgerError, LedgerResult};

pub const CONFIG_KEY: &str = "jomi_config_v2";
pub const RECORDS_KEY: &str = "jomi_records_v4";
pub const LAST_SYNC_KEY: &str = "jomi_last_sync";

/// Durable key-value storage for whole JSON documents
pub trait DocumentStore: Send + Sync {
    fn get(&self, key: &str) -> LedgerResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> LedgerResult<()>;
    fn remove(&self, key: &str) -> LedgerResult<()>;
}

/// Reads and decodes a document. Absent, unreadable or corrupt documents
/// all come back as `None` so the caller can fall back to defaults.
pub fn load_json<T: DeserializeOwned>(store: &dyn DocumentStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Failed to read document {}: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Discarding corrupt document {}: {}", key, e);
            None
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn DocumentStore,
    key: &str,
    value: &T,
) -> LedgerResult<()> {
    let raw = serde_json::to_string(value)?;
    store.put(key, &raw)
}

/// Volatile store, for tests and embedding without a database file
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, key: &str) -> LedgerResult<Option<String>> {
        let docs = self
            .documents
            .lock()
            .map_err(|e| LedgerError::DatabaseError(e.to_string()))?;
        Ok(docs.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> LedgerResult<()> {
        let mut docs = self
            .documents
            .lock()
            .map_err(|e| LedgerError::DatabaseError(e.to_string()))?;
        docs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> LedgerResult<()> {
        let mut docs = self
            .documents
            .lock()
            .map_err(|e| LedgerError::DatabaseError(e.to_string()))?;
        docs.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppConfig;

    #[test]
    fn test_corrupt_document_loads_as_none() {
        let store = MemoryStore::new();
        store.put(CONFIG_KEY, "{not json").unwrap();
        assert!(load_json::<AppConfig>(&store, CONFIG_KEY).is_none());
    }

    #[test]
    fn test_absent_document_loads_as_none() {
        let store = MemoryStore::new();
        assert!(load_json::<Vec<String>>(&store, RECORDS_KEY).is_none());
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        save_json(&store, LAST_SYNC_KEY, "18/10/2026, 10:00:00 AM").unwrap();
        let loaded: Option<String> = load_json(&store, LAST_SYNC_KEY);
        assert_eq!(loaded.as_deref(), Some("18/10/2026, 10:00:00 AM"));
    }
}
