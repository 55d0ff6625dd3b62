//! In-memory record store for testing and ephemeral sessions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::migrations::{self, SCHEMA_VERSION};
use crate::store::{RecordStore, META_CREATED_AT};
use nightops_common::{now_ms, Collection, Error, Record, Result};

#[derive(Debug, Default)]
struct Inner {
    open: bool,
    deny: bool,
    version: u32,
    notes: Vec<Record>,
    tasks: Vec<Record>,
    meta: HashMap<String, String>,
}

impl Inner {
    fn check(&self) -> Result<()> {
        if self.deny {
            return Err(Error::StorageUnavailable("Access denied by host".to_string()));
        }
        if !self.open {
            return Err(Error::StorageUnavailable("Store is not open".to_string()));
        }
        Ok(())
    }

    fn records(&self, collection: Collection) -> Result<&Vec<Record>> {
        match collection {
            Collection::Notes => Ok(&self.notes),
            Collection::Tasks => Ok(&self.tasks),
            Collection::Meta => Err(not_records(collection)),
        }
    }

    fn records_mut(&mut self, collection: Collection) -> Result<&mut Vec<Record>> {
        match collection {
            Collection::Notes => Ok(&mut self.notes),
            Collection::Tasks => Ok(&mut self.tasks),
            Collection::Meta => Err(not_records(collection)),
        }
    }
}

fn not_records(collection: Collection) -> Error {
    Error::InvalidInput(format!("'{}' is not a record collection", collection))
}

/// In-memory record store.
///
/// All data lives in memory and is lost on drop. Records are kept in
/// insertion order, which gives equal timestamps a stable listing order.
/// Cloning shares the underlying data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create a new, unopened memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that reports an existing on-disk schema version.
    ///
    /// Lets tests exercise the migration path.
    pub fn with_schema_version(version: u32) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.write() {
            inner.version = version;
        }
        store
    }

    /// Simulate the host denying (or restoring) storage access.
    pub fn deny_access(&self, deny: bool) {
        if let Ok(mut inner) = self.inner.write() {
            inner.deny = deny;
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| Error::StorageUnavailable("Memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| Error::StorageUnavailable("Memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn open(&self) -> Result<()> {
        let mut inner = self.write()?;
        if inner.deny {
            return Err(Error::StorageUnavailable("Access denied by host".to_string()));
        }
        if inner.open {
            return Ok(());
        }

        let fresh = inner.version == 0;
        for step in migrations::pending(inner.version)? {
            debug!(version = step.version, "Applying migration: {}", step.description);
            inner.version = step.version;
        }
        if fresh {
            inner.meta.insert(META_CREATED_AT.to_string(), now_ms().to_string());
        }
        inner.open = true;

        info!(version = SCHEMA_VERSION, "Memory store opened");
        Ok(())
    }

    async fn schema_version(&self) -> Result<u32> {
        let inner = self.read()?;
        inner.check()?;
        Ok(inner.version)
    }

    async fn put(&self, collection: Collection, record: Record) -> Result<()> {
        let mut inner = self.write()?;
        inner.check()?;

        let records = inner.records_mut(collection)?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<Record>> {
        let inner = self.read()?;
        inner.check()?;

        let mut records = inner.records(collection)?.clone();
        // Stable sort keeps insertion order among equal timestamps.
        records.sort_by(|a, b| b.updated_at_ms.cmp(&a.updated_at_ms));
        Ok(records)
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        let inner = self.read()?;
        inner.check()?;
        Ok(inner.records(collection)?.len())
    }

    async fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let inner = self.read()?;
        inner.check()?;
        Ok(inner.meta.get(key).cloned())
    }

    async fn put_meta(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.write()?;
        inner.check()?;
        inner.meta.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        let mut inner = self.write()?;
        inner.check()?;

        inner.notes.clear();
        inner.tasks.clear();
        inner.meta.clear();

        info!("Memory store cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_at(updated_at_ms: i64) -> Record {
        Record::new(vec![0u8; 12], vec![1, 2, 3], updated_at_ms)
    }

    async fn opened() -> MemoryStore {
        let store = MemoryStore::new();
        store.open().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_open_provisions_current_version() {
        let store = opened().await;
        assert_eq!(store.schema_version().await.unwrap(), SCHEMA_VERSION);
        assert!(store.get_meta(META_CREATED_AT).await.unwrap().is_some());

        // Opening again is harmless.
        store.open().await.unwrap();
    }

    #[tokio::test]
    async fn test_operations_before_open_fail() {
        let store = MemoryStore::new();
        let result = store.get_all(Collection::Notes).await;
        assert!(matches!(result, Err(Error::StorageUnavailable(_))));
    }

    #[tokio::test]
    async fn test_newer_schema_refused() {
        let store = MemoryStore::with_schema_version(SCHEMA_VERSION + 1);
        assert!(matches!(store.open().await, Err(Error::StorageUnavailable(_))));
    }

    #[tokio::test]
    async fn test_get_all_orders_by_updated_desc() {
        let store = opened().await;
        for ts in [100, 300, 200] {
            store.put(Collection::Notes, record_at(ts)).await.unwrap();
        }

        let order: Vec<i64> = store
            .get_all(Collection::Notes)
            .await
            .unwrap()
            .iter()
            .map(|r| r.updated_at_ms)
            .collect();
        assert_eq!(order, vec![300, 200, 100]);
    }

    #[tokio::test]
    async fn test_equal_timestamps_keep_insertion_order() {
        let store = opened().await;
        let first = record_at(500);
        let second = record_at(500);
        store.put(Collection::Tasks, first.clone()).await.unwrap();
        store.put(Collection::Tasks, second.clone()).await.unwrap();

        let all = store.get_all(Collection::Tasks).await.unwrap();
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[1].id, second.id);
    }

    #[tokio::test]
    async fn test_put_same_id_last_write_wins() {
        let store = opened().await;
        let mut record = record_at(1);
        store.put(Collection::Notes, record.clone()).await.unwrap();

        record.ciphertext = vec![9, 9, 9];
        record.updated_at_ms = 2;
        store.put(Collection::Notes, record.clone()).await.unwrap();

        let all = store.get_all(Collection::Notes).await.unwrap();
        assert_eq!(all, vec![record]);
    }

    #[tokio::test]
    async fn test_collections_are_separate() {
        let store = opened().await;
        store.put(Collection::Notes, record_at(1)).await.unwrap();

        assert_eq!(store.count(Collection::Notes).await.unwrap(), 1);
        assert_eq!(store.count(Collection::Tasks).await.unwrap(), 0);
        assert!(store.put(Collection::Meta, record_at(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let store = opened().await;
        store.put(Collection::Notes, record_at(1)).await.unwrap();
        store.put(Collection::Tasks, record_at(2)).await.unwrap();
        store.put_meta("theme", "dark").await.unwrap();

        store.clear_all().await.unwrap();
        store.clear_all().await.unwrap();

        assert_eq!(store.count(Collection::Notes).await.unwrap(), 0);
        assert_eq!(store.count(Collection::Tasks).await.unwrap(), 0);
        assert_eq!(store.get_meta("theme").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_denied_access() {
        let store = opened().await;
        store.deny_access(true);

        assert!(matches!(
            store.clear_all().await,
            Err(Error::StorageUnavailable(_))
        ));

        store.deny_access(false);
        assert!(store.clear_all().await.is_ok());
    }
}
