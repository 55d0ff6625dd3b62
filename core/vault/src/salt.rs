//! Installation salt, persisted in plain settings.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use nightops_common::{Error, Result};
use nightops_crypto::Salt;
use nightops_storage::{SettingsStore, SALT_KEY};

/// Reads, creates and caches the per-installation salt.
pub struct SaltSource {
    settings: Arc<dyn SettingsStore>,
    cache: Mutex<Option<Salt>>,
}

impl SaltSource {
    /// Salt source backed by `settings`, with an empty cache.
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            settings,
            cache: Mutex::new(None),
        }
    }

    /// Return the persisted salt, creating one on first use.
    ///
    /// Concurrent callers observe the same salt.
    ///
    /// # Errors
    /// - `CryptoUnavailable` if a new salt cannot be generated
    /// - `StorageUnavailable` if settings cannot be read or written
    pub async fn get_or_create_salt(&self) -> Result<Salt> {
        let mut cache = self.cache.lock().await;
        if let Some(salt) = *cache {
            return Ok(salt);
        }

        let salt = match self.settings.get(SALT_KEY).await? {
            Some(encoded) => Salt::from_base64(&encoded).map_err(|e| {
                Error::StorageUnavailable(format!("Stored salt is unreadable: {}", e))
            })?,
            None => {
                let salt = Salt::generate()?;
                self.settings.set(SALT_KEY, &salt.to_base64()).await?;
                info!("Generated installation salt");
                salt
            }
        };

        debug!("Salt loaded");
        *cache = Some(salt);
        Ok(salt)
    }

    /// Drop the cached salt so the next call re-reads settings.
    pub async fn forget(&self) {
        self.cache.lock().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightops_storage::MemorySettings;

    #[tokio::test]
    async fn test_salt_is_created_once() {
        let settings = Arc::new(MemorySettings::new());
        let source = SaltSource::new(settings.clone());

        let first = source.get_or_create_salt().await.unwrap();
        let second = source.get_or_create_salt().await.unwrap();
        assert_eq!(first, second);

        let persisted = settings.get(SALT_KEY).await.unwrap().unwrap();
        assert_eq!(persisted, first.to_base64());
    }

    #[tokio::test]
    async fn test_salt_survives_new_source() {
        let settings = Arc::new(MemorySettings::new());
        let first = SaltSource::new(settings.clone())
            .get_or_create_salt()
            .await
            .unwrap();
        let second = SaltSource::new(settings).get_or_create_salt().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_forget_after_clear_creates_new_salt() {
        let settings = Arc::new(MemorySettings::new());
        let source = SaltSource::new(settings.clone());
        let first = source.get_or_create_salt().await.unwrap();

        settings.clear().await.unwrap();
        // Still cached.
        assert_eq!(source.get_or_create_salt().await.unwrap(), first);

        source.forget().await;
        assert_ne!(source.get_or_create_salt().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_corrupt_salt_is_storage_error() {
        let settings = Arc::new(MemorySettings::new());
        settings.set(SALT_KEY, "!!!not base64").await.unwrap();

        let source = SaltSource::new(settings);
        assert!(matches!(
            source.get_or_create_salt().await,
            Err(Error::StorageUnavailable(_))
        ));
    }
}
