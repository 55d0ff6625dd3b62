//! Plain (unencrypted) key/value settings.
//!
//! Holds values that must be readable before the vault is unlocked, most
//! importantly the key-derivation salt. A full wipe clears it.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use nightops_common::{Error, Result};

/// Settings key under which the installation salt is stored.
pub const SALT_KEY: &str = "salt";

/// Plain key/value settings store.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove every value.
    async fn clear(&self) -> Result<()>;
}

/// In-memory settings, lost on drop.
#[derive(Default)]
pub struct MemorySettings {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemorySettings {
    /// Create empty settings.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> Error {
    Error::StorageUnavailable("Settings lock poisoned".to_string())
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().map_err(|_| poisoned())?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.values.write().map_err(|_| poisoned())?.clear();
        Ok(())
    }
}

/// Settings persisted as a flat JSON object in a single file.
///
/// A missing file reads as empty. Writes go to a sibling temp file first and
/// are renamed into place.
pub struct FileSettings {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSettings {
    /// Create settings backed by the file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        match fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                Error::StorageUnavailable(format!("Corrupt settings file: {}", e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(io_err(e)),
        }
    }

    async fn store(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(io_err)?;
            }
        }

        let bytes = serde_json::to_vec_pretty(values)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes).await.map_err(io_err)?;
        fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

fn io_err(e: std::io::Error) -> Error {
    Error::StorageUnavailable(format!("Settings I/O: {}", e))
}

#[async_trait]
impl SettingsStore for FileSettings {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load().await?;
        values.insert(key.to_string(), value.to_string());
        self.store(&values).await?;
        debug!(key, "Setting written");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_settings() {
        let settings = MemorySettings::new();
        assert_eq!(settings.get(SALT_KEY).await.unwrap(), None);

        settings.set(SALT_KEY, "abc").await.unwrap();
        assert_eq!(settings.get(SALT_KEY).await.unwrap().as_deref(), Some("abc"));

        settings.clear().await.unwrap();
        assert_eq!(settings.get(SALT_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_settings_persist() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("settings.json");

        let settings = FileSettings::new(&path);
        settings.set(SALT_KEY, "c2FsdA==").await.unwrap();
        settings.set("other", "1").await.unwrap();

        let reopened = FileSettings::new(&path);
        assert_eq!(reopened.get(SALT_KEY).await.unwrap().as_deref(), Some("c2FsdA=="));
        assert_eq!(reopened.get("other").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_file_settings_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let settings = FileSettings::new(temp.path().join("absent.json"));

        assert_eq!(settings.get(SALT_KEY).await.unwrap(), None);
        settings.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_settings_clear() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        let settings = FileSettings::new(&path);

        settings.set(SALT_KEY, "x").await.unwrap();
        settings.clear().await.unwrap();

        assert!(!path.exists());
        assert_eq!(settings.get(SALT_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_unavailable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        std::fs::write(&path, b"not json").unwrap();

        let settings = FileSettings::new(&path);
        assert!(matches!(
            settings.get(SALT_KEY).await,
            Err(Error::StorageUnavailable(_))
        ));
    }
}
