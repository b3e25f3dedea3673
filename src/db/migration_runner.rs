use rusqlite::{params, Connection, OptionalExtension, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const BACKUPS_TO_KEEP: usize = 5;

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

impl MigrationRunner {
    pub fn new() -> Self {
        Self {
            migrations: Self::collect_migrations(),
        }
    }

    fn collect_migrations() -> Vec<Migration> {
        vec![
            Migration::new(0, "bootstrap", include_str!("migrations/000_bootstrap.sql")),
            Migration::new(
                1,
                "initial_schema",
                include_str!("migrations/001_initial_schema.sql"),
            ),
            Migration::new(
                2,
                "add_market_snapshot",
                include_str!("migrations/002_add_market_snapshot.sql"),
            ),
        ]
    }

    /// Apply every migration newer than the recorded schema version.
    ///
    /// A file database that already has a schema is backed up first.
    pub fn run_pending_migrations(&self, conn: &Connection, db_path: &str) -> Result<usize> {
        let current_version = self.get_current_version(conn)?;
        log::info!("Current schema version: {:?}", current_version);

        let pending: Vec<&Migration> = self
            .migrations
            .iter()
            .filter(|m| match current_version {
                Some(v) => m.version > v,
                None => true,
            })
            .collect();

        let Some(last) = pending.last() else {
            return Ok(0);
        };

        log::info!("Found {} pending migrations", pending.len());

        let backup_path = match current_version {
            Some(_) if db_path != ":memory:" => {
                let path = self.create_backup(db_path, last.version)?;
                log::info!("Backup created: {}", path.display());
                Some(path)
            }
            _ => None,
        };

        let mut applied = 0;
        for migration in pending {
            if let Err(e) = self.apply_migration(conn, migration) {
                log::error!("Migration {} failed: {}", migration.version, e);
                log::error!("Migration stopped. Database rolled back to before this migration.");
                if let Some(path) = &backup_path {
                    log::error!("Backup available at: {}", path.display());
                }
                return Err(e);
            }
            applied += 1;
            log::info!("Applied migration {}: {}", migration.version, migration.name);
        }

        Ok(applied)
    }

    fn apply_migration(&self, conn: &Connection, migration: &Migration) -> Result<()> {
        let start = SystemTime::now();

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql)?;

        let execution_time = start
            .elapsed()
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at, checksum, execution_time_ms, notes)
             VALUES (?, ?, ?, ?, ?, NULL)",
            params![
                migration.version,
                migration.name,
                current_timestamp(),
                migration.checksum(),
                execution_time
            ],
        )?;

        tx.commit()?;

        log::debug!("Applied migration {} in {}ms", migration.name, execution_time);
        Ok(())
    }

    /// Fail when an applied migration no longer matches its recorded checksum.
    pub fn verify_migrations(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(
            "SELECT version, name, checksum FROM schema_migrations WHERE checksum IS NOT NULL ORDER BY version",
        )?;

        let applied: Vec<(u32, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<_>>>()?;

        for (version, name, stored_checksum) in applied {
            if let Some(migration) = self.migrations.iter().find(|m| m.version == version) {
                let expected_checksum = migration.checksum();
                if stored_checksum != expected_checksum {
                    log::error!("Checksum mismatch for migration {} ({})", version, name);
                    log::error!("Expected: {}", expected_checksum);
                    log::error!("Actual:   {}", stored_checksum);
                    return Err(rusqlite::Error::InvalidQuery);
                }
            }
        }

        Ok(())
    }

    pub fn get_current_version(&self, conn: &Connection) -> Result<Option<u32>> {
        if !self.has_schema_migrations_table(conn)? {
            return Ok(None);
        }

        let version: Option<u32> = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(version)
    }

    fn create_backup(&self, db_path: &str, target_version: u32) -> Result<PathBuf> {
        let db_path_buf = PathBuf::from(db_path);
        let db_dir = db_path_buf
            .parent()
            .ok_or_else(|| rusqlite::Error::InvalidPath(db_path_buf.clone()))?;

        let backup_dir = db_dir.join("backups");
        fs::create_dir_all(&backup_dir)
            .map_err(|e| storage_failure(format!("Failed to create backup directory: {}", e)))?;

        let backup_name = format!("pre_migration_v{}_{}.db", target_version, current_timestamp());
        let backup_path = backup_dir.join(&backup_name);

        let src = Connection::open(db_path)?;
        let mut dst = Connection::open(&backup_path)?;
        {
            let backup = rusqlite::backup::Backup::new(&src, &mut dst)?;
            backup.run_to_completion(5, std::time::Duration::from_millis(250), None)?;
        }

        let integrity: String = dst.pragma_query_value(None, "integrity_check", |row| row.get(0))?;
        if integrity != "ok" {
            return Err(storage_failure(format!(
                "Backup integrity check failed: {}",
                integrity
            )));
        }

        self.cleanup_old_backups(&backup_dir)?;

        Ok(backup_path)
    }

    fn cleanup_old_backups(&self, backup_dir: &Path) -> Result<()> {
        let mut backups: Vec<_> = fs::read_dir(backup_dir)
            .map_err(|e| storage_failure(format!("Failed to read backup directory: {}", e)))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.path().extension().and_then(|s| s.to_str()) == Some("db")
                    && entry
                        .file_name()
                        .to_str()
                        .map(|s| s.starts_with("pre_migration_"))
                        .unwrap_or(false)
            })
            .collect();

        // Oldest first
        backups.sort_by_key(|entry| {
            entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH)
        });

        if backups.len() > BACKUPS_TO_KEEP {
            for entry in backups.iter().take(backups.len() - BACKUPS_TO_KEEP) {
                if let Err(e) = fs::remove_file(entry.path()) {
                    log::warn!("Failed to delete old backup: {}", e);
                }
            }
        }

        Ok(())
    }

    fn has_schema_migrations_table(&self, conn: &Connection) -> Result<bool> {
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl Default for MigrationRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn storage_failure(message: String) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(1), Some(message))
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
