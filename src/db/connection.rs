use rusqlite::{params, Connection, OptionalExtension, Result};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::db::migration_runner::MigrationRunner;
use crate::db::store::DocumentStore;
use crate::error::{LedgerError, LedgerResult};

/// Rows kept in `sync_history`; older attempts are pruned on insert
pub const SYNC_HISTORY_KEEP: u32 = 500;

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::prepare(conn, db_path)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::prepare(Connection::open_in_memory()?, ":memory:")
    }

    fn prepare(conn: Connection, db_path: &str) -> Result<Self> {
        if db_path != ":memory:" {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }

        let runner = MigrationRunner::new();
        let applied = runner.run_pending_migrations(&conn, db_path)?;
        if applied > 0 {
            log::info!("Applied {} migrations", applied);
        } else {
            log::debug!("Database schema is up to date");
        }
        runner.verify_migrations(&conn)?;

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> LedgerResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| LedgerError::DatabaseError(e.to_string()))
    }

    pub fn record_sync_attempt(&self, entry: &NewSyncHistory) -> LedgerResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sync_history (direction, action, contract_id, status, error_message, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                entry.direction.as_str(),
                entry.action,
                entry.contract_id,
                entry.status.as_str(),
                entry.error_message,
                chrono::Utc::now().timestamp()
            ],
        )?;
        conn.execute(
            "DELETE FROM sync_history WHERE id NOT IN
             (SELECT id FROM sync_history ORDER BY id DESC LIMIT ?)",
            [SYNC_HISTORY_KEEP],
        )?;
        Ok(())
    }

    /// Most recent attempts first
    pub fn sync_history(&self, limit: u32) -> LedgerResult<Vec<SyncHistory>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, direction, action, contract_id, status, error_message, created_at
             FROM sync_history
             ORDER BY created_at DESC, id DESC
             LIMIT ?",
        )?;

        let rows = stmt.query_map([limit], |row| {
            Ok(SyncHistory {
                id: row.get(0)?,
                direction: row.get(1)?,
                action: row.get(2)?,
                contract_id: row.get(3)?,
                status: row.get(4)?,
                error_message: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>>>()?)
    }
}

impl DocumentStore for Database {
    fn get(&self, key: &str) -> LedgerResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM documents WHERE key = ?", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> LedgerResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> LedgerResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM documents WHERE key = ?", [key])?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    Push,
    Pull,
}

impl SyncDirection {
    fn as_str(self) -> &'static str {
        match self {
            SyncDirection::Push => "push",
            SyncDirection::Pull => "pull",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Failed,
    Skipped,
}

impl SyncStatus {
    fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
            SyncStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSyncHistory {
    pub direction: SyncDirection,
    pub action: String,
    pub contract_id: Option<String>,
    pub status: SyncStatus,
    pub error_message: Option<String>,
}

/// One row of the sync log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncHistory {
    pub id: i64,
    pub direction: String,
    pub action: String,
    pub contract_id: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_round_trip_and_overwrite() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get("k").unwrap(), None);

        db.put("k", "[1,2]").unwrap();
        db.put("k", "[3]").unwrap();
        assert_eq!(db.get("k").unwrap().as_deref(), Some("[3]"));

        db.remove("k").unwrap();
        assert_eq!(db.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_database_reopens_with_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let path = path.to_str().unwrap();

        {
            let db = Database::new(path).unwrap();
            db.put("jomi_records_v4", "[]").unwrap();
        }

        let db = Database::new(path).unwrap();
        assert_eq!(db.get("jomi_records_v4").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_sync_history_newest_first() {
        let db = Database::open_in_memory().unwrap();
        for (i, status) in [SyncStatus::Success, SyncStatus::Failed].into_iter().enumerate() {
            db.record_sync_attempt(&NewSyncHistory {
                direction: SyncDirection::Push,
                action: "edit".to_string(),
                contract_id: Some(format!("r{}", i)),
                status,
                error_message: None,
            })
            .unwrap();
        }

        let history = db.sync_history(10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].contract_id.as_deref(), Some("r1"));
        assert_eq!(history[0].status, "failed");

        assert_eq!(db.sync_history(1).unwrap().len(), 1);
    }

    #[test]
    fn test_sync_history_is_pruned_to_newest() {
        let db = Database::open_in_memory().unwrap();
        let total = SYNC_HISTORY_KEEP + 25;
        for i in 0..total {
            db.record_sync_attempt(&NewSyncHistory {
                direction: SyncDirection::Pull,
                action: "fetch".to_string(),
                contract_id: Some(format!("r{}", i)),
                status: SyncStatus::Failed,
                error_message: None,
            })
            .unwrap();
        }

        let history = db.sync_history(total).unwrap();
        assert_eq!(history.len(), SYNC_HISTORY_KEEP as usize);
        let newest = format!("r{}", total - 1);
        let oldest_kept = format!("r{}", total - SYNC_HISTORY_KEEP);
        assert_eq!(history[0].contract_id.as_deref(), Some(newest.as_str()));
        assert_eq!(
            history.last().and_then(|h| h.contract_id.as_deref()),
            Some(oldest_kept.as_str())
        );
    }
}
