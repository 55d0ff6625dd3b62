//! Record store trait definition.

use async_trait::async_trait;

use nightops_common::{Collection, Record, Result};

/// Durable storage for encrypted records.
///
/// Stores hold three collections: `notes` and `tasks` (records keyed by id,
/// indexed by `updated_at_ms`) and `meta` (plain key/value pairs). Records
/// are opaque to the store; nothing here knows about keys or plaintext.
///
/// Every operation other than [`RecordStore::open`] fails with
/// `StorageUnavailable` until the store has been opened.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Get the backend name (e.g., "memory", "sqlite").
    fn name(&self) -> &str;

    /// Open or create the store at the current schema version.
    ///
    /// # Postconditions
    /// - All collections and the `updated_at_ms` indexes exist
    /// - Older on-disk schemas have been migrated
    ///
    /// # Errors
    /// - `StorageUnavailable` if the host denies access, the data is
    ///   corrupt, or the on-disk schema is newer than supported
    async fn open(&self) -> Result<()>;

    /// Schema version currently on disk.
    async fn schema_version(&self) -> Result<u32>;

    /// Insert or replace a record by id (last write wins).
    ///
    /// # Errors
    /// - `InvalidInput` if `collection` is `meta`
    async fn put(&self, collection: Collection, record: Record) -> Result<()>;

    /// All records of a collection, most recently updated first.
    ///
    /// Records with equal timestamps keep insertion order.
    async fn get_all(&self, collection: Collection) -> Result<Vec<Record>>;

    /// Number of records in a collection.
    async fn count(&self, collection: Collection) -> Result<usize> {
        Ok(self.get_all(collection).await?.len())
    }

    /// Read a value from the `meta` collection.
    async fn get_meta(&self, key: &str) -> Result<Option<String>>;

    /// Write a value into the `meta` collection.
    async fn put_meta(&self, key: &str, value: &str) -> Result<()>;

    /// Irreversibly delete every entry of every collection.
    ///
    /// The store stays open and usable afterwards.
    async fn clear_all(&self) -> Result<()>;
}

/// Meta key recording when the store was first provisioned.
pub const META_CREATED_AT: &str = "created_at_ms";
