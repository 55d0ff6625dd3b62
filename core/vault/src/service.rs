//! Vault façade: unlock, save, list and wipe.
//!
//! One instance per data directory, constructed explicitly and driven through
//! `&self` so independent operations can run concurrently.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::VaultConfig;
use crate::listing::{ListEntry, RecordBody};
use crate::namespace::KeyNamespace;
use crate::salt::SaltSource;
use crate::session::{SessionHandle, SessionInfo, VaultSession};
use nightops_common::{now_ms, Collection, Error, Record, Result};
use nightops_crypto::{decrypt, derive_key, encrypt, SessionKey};
use nightops_storage::{RecordStore, SettingsStore};

/// Encrypted notes-and-tasks vault.
///
/// Starts Locked. `unlock` derives a session key; `lock`, `close` and `wipe`
/// drop it again.
pub struct VaultService {
    config: VaultConfig,
    store: Arc<dyn RecordStore>,
    settings: Arc<dyn SettingsStore>,
    salt: SaltSource,
    session: RwLock<Option<VaultSession>>,
    namespace: RwLock<KeyNamespace>,
}

/// Map any derivation-path failure into the unlock taxonomy.
fn unlock_error(e: Error) -> Error {
    match e {
        Error::CryptoUnavailable(_) | Error::UnlockFailed(_) => e,
        other => Error::UnlockFailed(other.to_string()),
    }
}

impl VaultService {
    /// Create a service over explicit backends.
    ///
    /// The store is not opened until [`VaultService::init`].
    pub fn new(
        config: VaultConfig,
        store: Arc<dyn RecordStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            salt: SaltSource::new(settings.clone()),
            config,
            store,
            settings,
            session: RwLock::new(None),
            namespace: RwLock::new(KeyNamespace::Primary),
        }
    }

    /// Create a service with backends resolved from `config`.
    ///
    /// # Errors
    /// - Unknown store type or invalid store configuration
    pub fn from_config(config: VaultConfig) -> Result<Self> {
        let store = config.default_store()?;
        let settings = config.build_settings();
        Ok(Self::new(config, store, settings))
    }

    /// Configuration the service was built with.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// The underlying record store.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Open the record store, migrating it if needed.
    ///
    /// # Errors
    /// - `StorageUnavailable` if the host denies access or the schema is newer
    pub async fn init(&self) -> Result<()> {
        self.store.open().await?;
        info!(store = self.store.name(), "Vault initialized");
        Ok(())
    }

    /// Drop the session key. The store stays usable for a later `unlock`.
    pub async fn close(&self) {
        self.lock().await;
        info!("Vault closed");
    }

    /// Derive a session key from `passphrase` in the active namespace.
    ///
    /// The passphrase is trimmed first. No stored verifier exists, so any
    /// non-empty passphrase succeeds; a wrong one shows up later as
    /// [`RecordBody::AuthFailed`] entries. Any previous key is discarded
    /// before derivation, so a failed re-unlock leaves the vault Locked.
    ///
    /// # Errors
    /// - `UnlockFailed` for an empty passphrase or unusable salt
    /// - `CryptoUnavailable` if the platform RNG or KDF backend is missing
    pub async fn unlock(&self, passphrase: &str) -> Result<SessionHandle> {
        let mut guard = self.session.write().await;
        guard.take();

        let passphrase = passphrase.trim();
        if passphrase.is_empty() {
            return Err(Error::UnlockFailed("Passphrase is empty".to_string()));
        }

        let namespace = *self.namespace.read().await;
        let salt = self.salt.get_or_create_salt().await.map_err(unlock_error)?;
        let input = namespace.apply(passphrase, &self.config.decoy_prefix);
        let params = self.config.kdf_params;

        debug!(iterations = params.iterations, %namespace, "Deriving session key");
        let key = tokio::task::spawn_blocking(move || derive_key(input.as_bytes(), &salt, &params))
            .await
            .map_err(|e| Error::CryptoUnavailable(format!("Key derivation task failed: {}", e)))?
            .map_err(unlock_error)?;

        let session = VaultSession::new(key, namespace);
        let handle = session.handle().clone();
        *guard = Some(session);

        info!(session = %handle, %namespace, "Vault unlocked");
        Ok(handle)
    }

    /// Drop the session key without touching stored data.
    pub async fn lock(&self) {
        if let Some(mut session) = self.session.write().await.take() {
            session.lock();
            info!(session = %session.handle(), "Vault locked");
        }
    }

    /// Whether a session key is currently held.
    pub async fn is_unlocked(&self) -> bool {
        self.session
            .read()
            .await
            .as_ref()
            .map(VaultSession::is_active)
            .unwrap_or(false)
    }

    /// Handle of the current session, if unlocked.
    pub async fn session_handle(&self) -> Option<SessionHandle> {
        self.session.read().await.as_ref().map(|s| s.handle().clone())
    }

    /// Namespace, handle and unlock time of the current session.
    pub async fn session_info(&self) -> Option<SessionInfo> {
        self.session.read().await.as_ref().and_then(VaultSession::info)
    }

    /// Namespace the next `unlock` derives into.
    pub async fn namespace(&self) -> KeyNamespace {
        *self.namespace.read().await
    }

    /// Select the namespace for the next `unlock`. The current key is kept.
    pub async fn set_namespace(&self, namespace: KeyNamespace) {
        *self.namespace.write().await = namespace;
        debug!(%namespace, "Key namespace selected");
    }

    async fn current_key(&self) -> Option<SessionKey> {
        self.session
            .read()
            .await
            .as_ref()
            .and_then(|s| s.key().ok().cloned())
    }

    /// Encrypt and store one record.
    ///
    /// Returns `Ok(None)` without writing when the trimmed text is empty.
    ///
    /// # Errors
    /// - `InvalidInput` for a non-record collection
    /// - `NotUnlocked` without a session key
    /// - `StorageUnavailable` if the write fails
    pub async fn save(&self, collection: Collection, plaintext: &str) -> Result<Option<Record>> {
        collection.ensure_records()?;
        let key = self.current_key().await.ok_or(Error::NotUnlocked)?;

        let text = plaintext.trim();
        if text.is_empty() {
            debug!(%collection, "Ignoring blank record");
            return Ok(None);
        }

        let sealed = encrypt(&key, text)?;
        let record = Record::new(sealed.iv.to_vec(), sealed.ciphertext, now_ms());
        self.store.put(collection, record.clone()).await?;

        info!(%collection, id = %record.id, size = text.len(), "Record saved");
        Ok(Some(record))
    }

    /// List a collection, newest first, decrypting what the current key can.
    ///
    /// Records that fail authentication are reported per entry, never as an
    /// error. A non-blank `filter` keeps only decrypted entries containing it.
    ///
    /// # Errors
    /// - `InvalidInput` for a non-record collection
    /// - `StorageUnavailable` if the read fails
    pub async fn list(&self, collection: Collection, filter: Option<&str>) -> Result<Vec<ListEntry>> {
        collection.ensure_records()?;
        let records = self.store.get_all(collection).await?;
        let key = self.current_key().await;

        let mut failed = 0usize;
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let body = match &key {
                None => RecordBody::Locked,
                Some(key) => match decrypt(key, &record.iv, &record.ciphertext) {
                    Ok(text) => RecordBody::Decrypted(text),
                    Err(_) => {
                        failed += 1;
                        warn!(%collection, id = %record.id, "Record failed authentication");
                        RecordBody::AuthFailed
                    }
                },
            };
            if body.matches(filter) {
                entries.push(ListEntry { record, body });
            }
        }

        debug!(%collection, shown = entries.len(), failed, "Listed records");
        Ok(entries)
    }

    /// Number of records in a collection. Works while Locked.
    pub async fn count(&self, collection: Collection) -> Result<usize> {
        collection.ensure_records()?;
        self.store.count(collection).await
    }

    /// Raw encrypted records of a collection, newest first. Works while Locked.
    ///
    /// # Errors
    /// - `InvalidInput` for a non-record collection
    /// - `StorageUnavailable` if the read fails
    pub async fn export(&self, collection: Collection) -> Result<Vec<Record>> {
        collection.ensure_records()?;
        let records = self.store.get_all(collection).await?;
        debug!(%collection, count = records.len(), "Exported records");
        Ok(records)
    }

    /// Irreversibly delete every record and the salt, and lock the vault.
    ///
    /// The key and cached salt are dropped before storage is touched, so the
    /// vault ends up Locked even when clearing fails.
    ///
    /// # Errors
    /// - `StorageUnavailable` if the host denies the delete
    pub async fn wipe(&self) -> Result<()> {
        self.lock().await;
        self.salt.forget().await;

        self.store.clear_all().await?;
        self.settings.clear().await?;

        info!("Vault wiped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightops_crypto::{KdfParams, Salt};
    use nightops_storage::{MemorySettings, MemoryStore, SALT_KEY};
    use proptest::prelude::*;
    use tempfile::TempDir;

    const PASSPHRASE: &str = "correct horse battery staple";

    fn test_params() -> KdfParams {
        KdfParams::with_iterations(1_000)
    }

    fn test_config() -> VaultConfig {
        VaultConfig::in_memory().with_kdf_params(test_params())
    }

    struct Fixture {
        vault: VaultService,
        store: MemoryStore,
        settings: Arc<MemorySettings>,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let settings = Arc::new(MemorySettings::new());
        let vault = VaultService::new(test_config(), Arc::new(store.clone()), settings.clone());
        vault.init().await.unwrap();
        Fixture {
            vault,
            store,
            settings,
        }
    }

    async fn unlocked() -> Fixture {
        let f = fixture().await;
        f.vault.unlock(PASSPHRASE).await.unwrap();
        f
    }

    /// Seal `text` the way the vault would under `passphrase`, with an
    /// explicit timestamp.
    async fn sealed_record(f: &Fixture, passphrase: &str, text: &str, updated_at_ms: i64) -> Record {
        let encoded = f.settings.get(SALT_KEY).await.unwrap().unwrap();
        let salt = Salt::from_base64(&encoded).unwrap();
        let key = derive_key(passphrase.as_bytes(), &salt, &test_params()).unwrap();
        let sealed = encrypt(&key, text).unwrap();
        Record::new(sealed.iv.to_vec(), sealed.ciphertext, updated_at_ms)
    }

    fn texts(entries: &[ListEntry]) -> Vec<&str> {
        entries.iter().map(ListEntry::display_text).collect()
    }

    #[tokio::test]
    async fn test_starts_locked() {
        let f = fixture().await;
        assert!(!f.vault.is_unlocked().await);
        assert!(f.vault.session_handle().await.is_none());
        assert!(matches!(
            f.vault.save(Collection::Notes, "hello").await,
            Err(Error::NotUnlocked)
        ));
    }

    #[tokio::test]
    async fn test_save_and_list_roundtrip() {
        let f = unlocked().await;

        let record = f
            .vault
            .save(Collection::Notes, "  buy milk \n")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.iv.len(), 12);

        let entries = f.vault.list(Collection::Notes, None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].record, record);
        assert_eq!(entries[0].body, RecordBody::Decrypted("buy milk".to_string()));
    }

    #[tokio::test]
    async fn test_blank_save_is_noop() {
        let f = unlocked().await;

        assert_eq!(f.vault.save(Collection::Tasks, "").await.unwrap(), None);
        assert_eq!(f.vault.save(Collection::Tasks, " \t\n ").await.unwrap(), None);
        assert_eq!(f.vault.count(Collection::Tasks).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_meta_is_not_a_record_collection() {
        let f = unlocked().await;
        assert!(matches!(
            f.vault.save(Collection::Meta, "x").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            f.vault.list(Collection::Meta, None).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let f = unlocked().await;
        for (text, ts) in [("a", 100), ("b", 300), ("c", 200)] {
            let record = sealed_record(&f, PASSPHRASE, text, ts).await;
            f.store.put(Collection::Notes, record).await.unwrap();
        }

        let entries = f.vault.list(Collection::Notes, None).await.unwrap();
        let order: Vec<i64> = entries.iter().map(|e| e.record.updated_at_ms).collect();
        assert_eq!(order, vec![300, 200, 100]);
        assert_eq!(texts(&entries), vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_partial_failure_listing() {
        let f = unlocked().await;
        f.vault.save(Collection::Notes, "one").await.unwrap();
        f.vault.save(Collection::Notes, "two").await.unwrap();
        let foreign = sealed_record(&f, "someone else", "three", now_ms()).await;
        f.store.put(Collection::Notes, foreign).await.unwrap();

        let entries = f.vault.list(Collection::Notes, None).await.unwrap();
        assert_eq!(entries.len(), 3);

        let decrypted = entries
            .iter()
            .filter(|e| matches!(e.body, RecordBody::Decrypted(_)))
            .count();
        let failed = entries
            .iter()
            .filter(|e| e.body == RecordBody::AuthFailed)
            .count();
        assert_eq!(decrypted, 2);
        assert_eq!(failed, 1);
    }

    #[tokio::test]
    async fn test_locked_listing_shows_placeholders() {
        let f = unlocked().await;
        f.vault.save(Collection::Tasks, "water plants").await.unwrap();
        f.vault.lock().await;

        assert!(!f.vault.is_unlocked().await);
        let entries = f.vault.list(Collection::Tasks, None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].body, RecordBody::Locked);
        assert_eq!(entries[0].display_text(), "(locked)");
        assert_eq!(f.vault.count(Collection::Tasks).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_filter_scenario() {
        let f = unlocked().await;
        f.vault.save(Collection::Notes, "buy milk").await.unwrap();
        f.vault.save(Collection::Notes, "call mom").await.unwrap();

        let entries = f.vault.list(Collection::Notes, Some("milk")).await.unwrap();
        assert_eq!(texts(&entries), vec!["buy milk"]);

        let entries = f.vault.list(Collection::Notes, Some("MOM")).await.unwrap();
        assert_eq!(texts(&entries), vec!["call mom"]);

        let entries = f.vault.list(Collection::Notes, Some("  ")).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_filter_hides_locked_entries() {
        let f = unlocked().await;
        f.vault.save(Collection::Notes, "buy milk").await.unwrap();
        f.vault.lock().await;

        let entries = f.vault.list(Collection::Notes, Some("milk")).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_passphrase_unlocks_but_fails_authentication() {
        let f = unlocked().await;
        f.vault.save(Collection::Notes, "secret").await.unwrap();

        f.vault.unlock("not the passphrase").await.unwrap();
        let entries = f.vault.list(Collection::Notes, None).await.unwrap();
        assert_eq!(entries[0].body, RecordBody::AuthFailed);
        assert_eq!(entries[0].display_text(), "🔒 (wrong passphrase?)");

        f.vault.unlock(PASSPHRASE).await.unwrap();
        let entries = f.vault.list(Collection::Notes, None).await.unwrap();
        assert_eq!(entries[0].body, RecordBody::Decrypted("secret".to_string()));
    }

    #[tokio::test]
    async fn test_empty_passphrase_fails_and_discards_old_key() {
        let f = unlocked().await;
        assert!(f.vault.is_unlocked().await);

        let err = f.vault.unlock("   ").await.unwrap_err();
        assert!(matches!(err, Error::UnlockFailed(_)));
        assert!(err.is_recoverable());
        assert!(!f.vault.is_unlocked().await);
    }

    #[tokio::test]
    async fn test_unlock_handles_differ() {
        let f = fixture().await;
        let first = f.vault.unlock(PASSPHRASE).await.unwrap();
        let second = f.vault.unlock(PASSPHRASE).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(f.vault.session_handle().await, Some(second));
    }

    #[tokio::test]
    async fn test_decoy_namespace_is_separate() {
        let f = unlocked().await;
        f.vault.save(Collection::Notes, "real").await.unwrap();

        f.vault.set_namespace(KeyNamespace::Decoy).await;
        // Toggling alone keeps the current key.
        assert!(f.vault.is_unlocked().await);
        assert_eq!(
            texts(&f.vault.list(Collection::Notes, None).await.unwrap()),
            vec!["real"]
        );

        f.vault.unlock(PASSPHRASE).await.unwrap();
        f.vault.save(Collection::Notes, "decoy").await.unwrap();
        let mut shown = texts(&f.vault.list(Collection::Notes, None).await.unwrap())
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        shown.sort();
        assert_eq!(shown, vec!["decoy", "🔒 (wrong passphrase?)"]);

        f.vault.set_namespace(KeyNamespace::Primary).await;
        f.vault.unlock(PASSPHRASE).await.unwrap();
        let entries = f.vault.list(Collection::Notes, None).await.unwrap();
        let decrypted: Vec<&str> = entries.iter().filter_map(|e| e.body.plaintext()).collect();
        assert_eq!(decrypted, vec!["real"]);
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_decoy_matches_prefixed_primary() {
        let f = fixture().await;
        f.vault.set_namespace(KeyNamespace::Decoy).await;
        f.vault.unlock("pw").await.unwrap();
        f.vault.save(Collection::Notes, "hello").await.unwrap();

        f.vault.set_namespace(KeyNamespace::Primary).await;
        f.vault.unlock("decoy:pw").await.unwrap();
        let entries = f.vault.list(Collection::Notes, None).await.unwrap();
        assert_eq!(texts(&entries), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_concurrent_saves() {
        let f = unlocked().await;

        let (a, b) = tokio::join!(
            f.vault.save(Collection::Tasks, "first"),
            f.vault.save(Collection::Tasks, "second"),
        );
        let a = a.unwrap().unwrap();
        let b = b.unwrap().unwrap();

        assert_ne!(a.id, b.id);
        assert_ne!(a.iv, b.iv);
        assert_eq!(f.vault.count(Collection::Tasks).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_wipe_clears_everything() {
        let f = unlocked().await;
        f.vault.save(Collection::Notes, "n").await.unwrap();
        f.vault.save(Collection::Tasks, "t").await.unwrap();
        let old_salt = f.settings.get(SALT_KEY).await.unwrap().unwrap();

        f.vault.wipe().await.unwrap();

        assert!(!f.vault.is_unlocked().await);
        assert_eq!(f.vault.count(Collection::Notes).await.unwrap(), 0);
        assert_eq!(f.vault.count(Collection::Tasks).await.unwrap(), 0);
        assert_eq!(f.settings.get(SALT_KEY).await.unwrap(), None);

        f.vault.unlock(PASSPHRASE).await.unwrap();
        let new_salt = f.settings.get(SALT_KEY).await.unwrap().unwrap();
        assert_ne!(old_salt, new_salt);
    }

    #[tokio::test]
    async fn test_wipe_is_idempotent_and_safe_when_locked() {
        let f = fixture().await;
        f.vault.wipe().await.unwrap();
        f.vault.wipe().await.unwrap();
        assert!(!f.vault.is_unlocked().await);
    }

    #[tokio::test]
    async fn test_wipe_while_locked_clears_saved_records() {
        let f = unlocked().await;
        f.vault.save(Collection::Notes, "note").await.unwrap();
        f.vault.save(Collection::Tasks, "task").await.unwrap();
        f.vault.lock().await;
        assert!(f.settings.get(SALT_KEY).await.unwrap().is_some());

        f.vault.wipe().await.unwrap();
        f.vault.wipe().await.unwrap();

        for collection in Collection::RECORDS {
            assert_eq!(f.vault.count(collection).await.unwrap(), 0);
            assert!(f.vault.export(collection).await.unwrap().is_empty());
        }
        assert_eq!(f.settings.get(SALT_KEY).await.unwrap(), None);
        assert!(!f.vault.is_unlocked().await);
    }

    #[tokio::test]
    async fn test_session_info_tracks_unlock() {
        let f = fixture().await;
        assert!(f.vault.session_info().await.is_none());

        f.vault.set_namespace(KeyNamespace::Decoy).await;
        let handle = f.vault.unlock(PASSPHRASE).await.unwrap();
        // Toggling back does not change the namespace of the held key.
        f.vault.set_namespace(KeyNamespace::Primary).await;

        let info = f.vault.session_info().await.unwrap();
        assert_eq!(info.handle, handle);
        assert_eq!(info.namespace, KeyNamespace::Decoy);

        f.vault.lock().await;
        assert!(f.vault.session_info().await.is_none());
    }

    #[tokio::test]
    async fn test_export_returns_ciphertext_without_unlock() {
        let f = unlocked().await;
        let saved = f
            .vault
            .save(Collection::Notes, "secret")
            .await
            .unwrap()
            .unwrap();
        f.vault.lock().await;

        let exported = f.vault.export(Collection::Notes).await.unwrap();
        assert_eq!(exported, vec![saved]);
        assert!(!exported[0].to_json().unwrap().contains("secret"));
        assert!(matches!(
            f.vault.export(Collection::Meta).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_wipe_denied_surfaces_storage_error() {
        let f = unlocked().await;
        f.vault.save(Collection::Notes, "keep").await.unwrap();
        f.store.deny_access(true);

        assert!(matches!(
            f.vault.wipe().await,
            Err(Error::StorageUnavailable(_))
        ));
        assert!(!f.vault.is_unlocked().await);

        f.store.deny_access(false);
        assert_eq!(f.vault.count(Collection::Notes).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_init_denied() {
        let store = MemoryStore::new();
        store.deny_access(true);
        let vault = VaultService::new(
            test_config(),
            Arc::new(store),
            Arc::new(MemorySettings::new()),
        );
        assert!(matches!(
            vault.init().await,
            Err(Error::StorageUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_close_drops_key() {
        let f = unlocked().await;
        f.vault.close().await;
        assert!(!f.vault.is_unlocked().await);
        assert!(matches!(
            f.vault.save(Collection::Notes, "x").await,
            Err(Error::NotUnlocked)
        ));
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let temp = TempDir::new().unwrap();
        let config = VaultConfig::for_data_dir(temp.path()).with_kdf_params(test_params());

        {
            let vault = VaultService::from_config(config.clone()).unwrap();
            vault.init().await.unwrap();
            vault.unlock(PASSPHRASE).await.unwrap();
            vault.save(Collection::Notes, "durable").await.unwrap();
            vault.close().await;
        }

        let vault = VaultService::from_config(config).unwrap();
        vault.init().await.unwrap();
        assert_eq!(vault.count(Collection::Notes).await.unwrap(), 1);

        vault.unlock(PASSPHRASE).await.unwrap();
        let entries = vault.list(Collection::Notes, None).await.unwrap();
        assert_eq!(texts(&entries), vec!["durable"]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_save_then_list_returns_trimmed_text(text in "\\PC*[a-zA-Z0-9]\\PC*") {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let entries = runtime.block_on(async {
                let f = unlocked().await;
                f.vault.save(Collection::Notes, &text).await.unwrap().unwrap();
                f.vault.list(Collection::Notes, None).await.unwrap()
            });

            prop_assert_eq!(entries.len(), 1);
            prop_assert_eq!(entries[0].body.plaintext(), Some(text.trim()));
        }
    }
}
