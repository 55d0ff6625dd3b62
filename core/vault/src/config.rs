//! Vault configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::namespace::DEFAULT_DECOY_PREFIX;
use nightops_common::{Error, Result};
use nightops_crypto::KdfParams;
use nightops_storage::{
    create_default_registry, FileSettings, MemorySettings, RecordStore, SettingsStore,
};

/// Record database file name inside a data directory.
pub const DATABASE_FILENAME: &str = "vault.db";

/// Plain settings file name inside a data directory.
pub const SETTINGS_FILENAME: &str = "settings.json";

/// Configuration for a [`crate::VaultService`].
///
/// Serialized as JSON. Nothing in here is secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// KDF parameters used on every unlock.
    pub kdf_params: KdfParams,
    /// Record store backend name (e.g., "memory", "sqlite").
    pub store_type: String,
    /// Backend-specific configuration.
    pub store_config: serde_json::Value,
    /// Where plain settings (the salt) live. `None` keeps them in memory.
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
    /// Passphrase prefix selecting the decoy key namespace.
    #[serde(default = "default_decoy_prefix")]
    pub decoy_prefix: String,
}

fn default_decoy_prefix() -> String {
    DEFAULT_DECOY_PREFIX.to_string()
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf_params: KdfParams::standard(),
            store_type: "memory".to_string(),
            store_config: serde_json::Value::Null,
            settings_path: None,
            decoy_prefix: default_decoy_prefix(),
        }
    }
}

impl VaultConfig {
    /// Ephemeral configuration: memory store, memory settings.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Durable configuration rooted at `dir`.
    ///
    /// Records go to `vault.db` (SQLite) and settings to `settings.json`.
    pub fn for_data_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            store_type: "sqlite".to_string(),
            store_config: serde_json::json!({
                "path": dir.join(DATABASE_FILENAME),
            }),
            settings_path: Some(dir.join(SETTINGS_FILENAME)),
            ..Self::default()
        }
    }

    /// Replace the KDF parameters.
    pub fn with_kdf_params(mut self, params: KdfParams) -> Self {
        self.kdf_params = params;
        self
    }

    /// Check the configuration for production use.
    ///
    /// # Errors
    /// - Iteration count below [`KdfParams::MIN_ITERATIONS`]
    /// - Empty store type or decoy prefix
    pub fn validate(&self) -> Result<()> {
        self.kdf_params.validate()?;
        if self.store_type.trim().is_empty() {
            return Err(Error::InvalidInput("Store type must not be empty".to_string()));
        }
        if self.decoy_prefix.is_empty() {
            return Err(Error::InvalidInput(
                "Decoy prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the configured record store through the built-in registry.
    pub fn default_store(&self) -> Result<Arc<dyn RecordStore>> {
        create_default_registry().resolve(&self.store_type, &self.store_config)
    }

    /// Build the configured settings store.
    pub fn build_settings(&self) -> Arc<dyn SettingsStore> {
        match &self.settings_path {
            Some(path) => Arc::new(FileSettings::new(path)),
            None => Arc::new(MemorySettings::new()),
        }
    }

    /// Serialize configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }
}
