use rusqlite::{params, Connection, OptionalExtension, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

const KEEP_BACKUPS: usize = 5;

const DOCUMENTS_SQL: &str = "
CREATE TABLE IF NOT EXISTS documents (
    key         TEXT PRIMARY KEY NOT NULL,
    value       TEXT NOT NULL,
    updated_at  INTEGER NOT NULL
);
";

const SYNC_HISTORY_SQL: &str = "
CREATE TABLE IF NOT EXISTS sync_history (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    direction      TEXT NOT NULL CHECK (direction IN ('push', 'pull')),
    action         TEXT NOT NULL,
    contract_id    TEXT,
    status         TEXT NOT NULL CHECK (status IN ('success', 'failed', 'skipped')),
    error_message  TEXT,
    created_at     INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sync_history_created_at ON sync_history (created_at DESC);
";

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

impl Migration {
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sql.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn new(version: u32, name: &'static str, sql: &'static str) -> Self {
        Self { version, name, sql }
    }
}

pub struct MigrationRunner {
    migrations: Vec<Migration>,
}

impl Default for MigrationRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationRunner {
    pub fn new() -> Self {
        Self {
            migrations: vec![
                Migration::new(1, "documents", DOCUMENTS_SQL),
                Migration::new(2, "sync_history", SYNC_HISTORY_SQL),
            ],
        }
    }

    fn ensure_migrations_table(&self, conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version     INTEGER PRIMARY KEY NOT NULL,
                name        TEXT NOT NULL,
                applied_at  INTEGER NOT NULL,
                checksum    TEXT NOT NULL,
                execution_time_ms INTEGER NOT NULL
            );",
        )
    }

    /// Applies every migration newer than the stored version. A file-backed
    /// database is backed up first; `:memory:` is not.
    pub fn run_pending_migrations(&self, conn: &Connection, db_path: &str) -> Result<usize> {
        self.ensure_migrations_table(conn)?;

        let current_version = self.get_current_version(conn)?.unwrap_or(0);
        let pending: Vec<&Migration> = self
            .migrations
            .iter()
            .filter(|m| m.version > current_version)
            .collect();

        let Some(target) = pending.last() else {
            return Ok(0);
        };

        log::info!(
            "Found {} pending migrations (v{} -> v{})",
            pending.len(),
            current_version,
            target.version
        );

        if current_version > 0 && db_path != ":memory:" {
            let backup_path = self.create_backup(conn, db_path, target.version)?;
            log::info!("Backup created: {}", backup_path.display());
        }

        let mut applied = 0;
        for migration in pending {
            if let Err(e) = self.apply_migration(conn, migration) {
                log::error!("Migration {} ({}) failed: {}", migration.version, migration.name, e);
                return Err(e);
            }
            applied += 1;
        }

        Ok(applied)
    }

    fn apply_migration(&self, conn: &Connection, migration: &Migration) -> Result<()> {
        let start = Instant::now();
        let tx = conn.unchecked_transaction()?;

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at, checksum, execution_time_ms)
             VALUES (?, ?, ?, ?, ?)",
            params![
                migration.version,
                migration.name,
                chrono::Utc::now().timestamp(),
                migration.checksum(),
                start.elapsed().as_millis() as i64
            ],
        )?;
        tx.commit()?;

        log::info!("Applied migration {}: {}", migration.version, migration.name);
        Ok(())
    }

    /// Fails when an applied migration's SQL no longer matches what ran
    pub fn verify_migrations(&self, conn: &Connection) -> Result<()> {
        let mut stmt =
            conn.prepare("SELECT version, name, checksum FROM schema_migrations ORDER BY version")?;

        let applied: Vec<(u32, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<_>>>()?;

        for (version, name, stored) in applied {
            if let Some(migration) = self.migrations.iter().find(|m| m.version == version) {
                if stored != migration.checksum() {
                    log::error!("Checksum mismatch for migration {} ({})", version, name);
                    return Err(rusqlite::Error::InvalidQuery);
                }
            }
        }

        Ok(())
    }

    pub fn get_current_version(&self, conn: &Connection) -> Result<Option<u32>> {
        let exists: i32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
            [],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Ok(None);
        }

        let version: Option<u32> = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get::<_, Option<u32>>(0)
            })
            .optional()?
            .flatten();

        Ok(version)
    }

    fn create_backup(&self, conn: &Connection, db_path: &str, target_version: u32) -> Result<PathBuf> {
        let db_path_buf = PathBuf::from(db_path);
        let backup_dir = db_path_buf
            .parent()
            .ok_or_else(|| rusqlite::Error::InvalidPath(db_path_buf.clone()))?
            .join("backups");

        fs::create_dir_all(&backup_dir).map_err(|e| io_failure("create backup directory", e))?;

        let backup_path = backup_dir.join(format!(
            "pre_migration_v{}_{}.db",
            target_version,
            chrono::Utc::now().timestamp()
        ));

        let mut dst = Connection::open(&backup_path)?;
        {
            let backup = rusqlite::backup::Backup::new(conn, &mut dst)?;
            backup.run_to_completion(5, std::time::Duration::from_millis(250), None)?;
        }

        self.cleanup_old_backups(&backup_dir);
        Ok(backup_path)
    }

    fn cleanup_old_backups(&self, backup_dir: &Path) {
        let Ok(entries) = fs::read_dir(backup_dir) else {
            log::warn!("Failed to read backup directory {}", backup_dir.display());
            return;
        };

        let mut backups: Vec<_> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|s| s.starts_with("pre_migration_") && s.ends_with(".db"))
            })
            .collect();

        backups.sort_by_key(|entry| {
            entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH)
        });

        if backups.len() > KEEP_BACKUPS {
            for entry in backups.iter().take(backups.len() - KEEP_BACKUPS) {
                if let Err(e) = fs::remove_file(entry.path()) {
                    log::warn!("Failed to delete old backup: {}", e);
                }
            }
        }
    }
}

fn io_failure(what: &str, err: std::io::Error) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(1),
        Some(format!("Failed to {}: {}", what, err)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_sequential() {
        let runner = MigrationRunner::new();
        for (i, m) in runner.migrations.iter().enumerate() {
            assert_eq!(m.version as usize, i + 1, "Migration versions must be sequential");
        }
    }

    #[test]
    fn test_fresh_install_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new();

        let applied = runner.run_pending_migrations(&conn, ":memory:").unwrap();
        assert_eq!(applied, 2);
        assert_eq!(runner.get_current_version(&conn).unwrap(), Some(2));

        for table in ["documents", "sync_history", "schema_migrations"] {
            let count: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                    params![table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_idempotency() {
        let conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new();

        assert!(runner.run_pending_migrations(&conn, ":memory:").unwrap() > 0);
        assert_eq!(runner.run_pending_migrations(&conn, ":memory:").unwrap(), 0);
        runner.verify_migrations(&conn).unwrap();
    }

    #[test]
    fn test_tampered_checksum_is_detected() {
        let conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new();
        runner.run_pending_migrations(&conn, ":memory:").unwrap();

        conn.execute("UPDATE schema_migrations SET checksum = 'bogus' WHERE version = 1", [])
            .unwrap();
        assert!(runner.verify_migrations(&conn).is_err());
    }

    fn backup_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_upgrade_backs_up_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("ledger.db");
        let db_path = db_path.to_str().unwrap();
        let conn = Connection::open(db_path).unwrap();

        // A database left at v1 by an older build
        let older = MigrationRunner {
            migrations: vec![Migration::new(1, "documents", DOCUMENTS_SQL)],
        };
        assert_eq!(older.run_pending_migrations(&conn, db_path).unwrap(), 1);
        assert!(!dir.path().join("backups").exists());
        conn.execute(
            "INSERT INTO documents (key, value, updated_at) VALUES ('k', '[]', 0)",
            [],
        )
        .unwrap();

        let runner = MigrationRunner::new();
        assert_eq!(runner.run_pending_migrations(&conn, db_path).unwrap(), 1);

        let backups = dir.path().join("backups");
        let names = backup_files(&backups);
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("pre_migration_v2_"));

        // The copy holds the v1 state
        let copy = Connection::open(backups.join(&names[0])).unwrap();
        assert_eq!(runner.get_current_version(&copy).unwrap(), Some(1));
        let value: String = copy
            .query_row("SELECT value FROM documents WHERE key = 'k'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(value, "[]");
    }

    #[test]
    fn test_old_backups_are_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let backups = dir.path().join("backups");
        fs::create_dir_all(&backups).unwrap();

        for i in 0..7u64 {
            let path = backups.join(format!("pre_migration_v1_{}.db", i));
            let file = fs::File::create(&path).unwrap();
            file.set_modified(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000 + i))
                .unwrap();
        }
        fs::write(backups.join("notes.txt"), "keep").unwrap();

        let db_path = dir.path().join("ledger.db");
        let db_path = db_path.to_str().unwrap();
        let conn = Connection::open(db_path).unwrap();
        let runner = MigrationRunner::new();
        let created = runner.create_backup(&conn, db_path, 3).unwrap();

        let names = backup_files(&backups);
        let kept: Vec<&String> = names.iter().filter(|n| n.starts_with("pre_migration_")).collect();
        assert_eq!(kept.len(), KEEP_BACKUPS);
        assert!(created.exists());
        assert!(names.contains(&"notes.txt".to_string()));
        // Oldest go first
        for i in 0..3 {
            assert!(!names.contains(&format!("pre_migration_v1_{}.db", i)));
        }
    }

    #[test]
    fn test_unmigrated_database_has_no_version() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(MigrationRunner::new().get_current_version(&conn).unwrap(), None);
    }
}
