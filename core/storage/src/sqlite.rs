//! SQLite-backed durable record store.
//!
//! The schema version lives in `PRAGMA user_version`; migrations run inside a
//! single transaction on open.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::migrations;
use crate::store::{RecordStore, META_CREATED_AT};
use nightops_common::{now_ms, Collection, Error, Record, RecordId, Result};

/// Path understood by SQLite as a private in-memory database.
const IN_MEMORY: &str = ":memory:";

fn storage_err(e: rusqlite::Error) -> Error {
    Error::StorageUnavailable(format!("SQLite: {}", e))
}

fn table(collection: Collection) -> Result<&'static str> {
    collection.ensure_records()?;
    Ok(collection.as_str())
}

/// SQLite record store.
///
/// Opening is explicit: constructing the store does not touch the disk.
pub struct SqliteStore {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
    /// Create a store backed by the database file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            conn: Mutex::new(None),
        }
    }

    /// Create a store backed by a private in-memory database (for testing).
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| Error::StorageUnavailable("Connection lock poisoned".to_string()))?;
        let conn = guard
            .as_mut()
            .ok_or_else(|| Error::StorageUnavailable("Store is not open".to_string()))?;
        f(conn)
    }

    fn read_version(conn: &Connection) -> Result<u32> {
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(storage_err)?;
        u32::try_from(version)
            .map_err(|_| Error::StorageUnavailable(format!("Invalid schema version {}", version)))
    }

    fn migrate(conn: &mut Connection) -> Result<()> {
        let current = Self::read_version(conn)?;
        let steps = migrations::pending(current)?;
        if steps.is_empty() {
            return Ok(());
        }

        let tx = conn.transaction().map_err(storage_err)?;
        for step in &steps {
            debug!(version = step.version, "Applying migration: {}", step.description);
            tx.execute_batch(step.sql).map_err(storage_err)?;
            tx.execute_batch(&format!("PRAGMA user_version = {}", step.version))
                .map_err(storage_err)?;
        }
        if current == 0 {
            tx.execute(
                "INSERT OR IGNORE INTO meta (k, v) VALUES (?1, ?2)",
                params![META_CREATED_AT, now_ms().to_string()],
            )
            .map_err(storage_err)?;
        }
        tx.commit().map_err(storage_err)?;

        info!(from = current, to = migrations::SCHEMA_VERSION, "Store schema migrated");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn open(&self) -> Result<()> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| Error::StorageUnavailable("Connection lock poisoned".to_string()))?;
        if guard.is_some() {
            return Ok(());
        }

        let mut conn = Connection::open(&self.path).map_err(storage_err)?;
        Self::migrate(&mut conn)?;
        *guard = Some(conn);

        info!(path = %self.path.display(), "SQLite store opened");
        Ok(())
    }

    async fn schema_version(&self) -> Result<u32> {
        self.with_conn(|conn| Self::read_version(conn))
    }

    async fn put(&self, collection: Collection, record: Record) -> Result<()> {
        let table = table(collection)?;
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {table} (id, iv, ciphertext, updated_at_ms)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO UPDATE SET
                        iv = excluded.iv,
                        ciphertext = excluded.ciphertext,
                        updated_at_ms = excluded.updated_at_ms"
                ),
                params![
                    record.id.to_string(),
                    record.iv,
                    record.ciphertext,
                    record.updated_at_ms,
                ],
            )
            .map_err(storage_err)?;
            Ok(())
        })
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<Record>> {
        let table = table(collection)?;
        let rows = self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT id, iv, ciphertext, updated_at_ms FROM {table}
                     ORDER BY updated_at_ms DESC, rowid ASC"
                ))
                .map_err(storage_err)?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                })
                .map_err(storage_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)?;
            Ok(rows)
        })?;

        rows.into_iter()
            .map(|(id, iv, ciphertext, updated_at_ms)| {
                let id = RecordId::parse(&id).map_err(|_| {
                    Error::StorageUnavailable(format!("Corrupt record id in {}: {}", table, id))
                })?;
                Ok(Record {
                    id,
                    iv,
                    ciphertext,
                    updated_at_ms,
                })
            })
            .collect()
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        let table = table(collection)?;
        let count: i64 = self.with_conn(|conn| {
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .map_err(storage_err)
        })?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn get_meta(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT v FROM meta WHERE k = ?1", [key], |row| row.get(0))
                .optional()
                .map_err(storage_err)
        })
    }

    async fn put_meta(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO meta (k, v) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(storage_err)?;
            Ok(())
        })
    }

    async fn clear_all(&self) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(storage_err)?;
            for collection in Collection::ALL {
                tx.execute(&format!("DELETE FROM {}", collection.as_str()), [])
                    .map_err(storage_err)?;
            }
            tx.commit().map_err(storage_err)
        })?;

        info!("SQLite store cleared");
        Ok(())
    }
}
