//! Built-in record-store backends, selectable by name from configuration.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::memory::MemoryStore;
use crate::sqlite::SqliteStore;
use crate::store::RecordStore;
use nightops_common::{Error, Result};

/// Builds a store from its JSON configuration.
pub type StoreFactory = Box<dyn Fn(&Value) -> Result<Arc<dyn RecordStore>> + Send + Sync>;

/// Name-to-factory table for record stores.
pub struct StoreRegistry {
    factories: BTreeMap<&'static str, StoreFactory>,
}

impl StoreRegistry {
    /// Build the returned store from `config` without opening it.
    ///
    /// # Errors
    /// - `NotFound` if no backend is registered under `name`
    /// - `InvalidInput` if the backend rejects its configuration
    pub fn resolve(&self, name: &str, config: &Value) -> Result<Arc<dyn RecordStore>> {
        match self.factories.get(name) {
            Some(factory) => factory(config),
            None => Err(Error::NotFound(format!(
                "Store '{}' is not registered (known: {})",
                name,
                self.stores().join(", ")
            ))),
        }
    }

    /// Registered backend names, sorted.
    pub fn stores(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

fn sqlite_factory(config: &Value) -> Result<Arc<dyn RecordStore>> {
    let path = config
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidInput("SQLite store requires a 'path'".to_string()))?;
    Ok(Arc::new(SqliteStore::new(path)))
}

/// Registry holding the built-in stores.
///
/// - `memory`: ephemeral, ignores its configuration
/// - `sqlite`: requires `{"path": "<database file>"}`
pub fn create_default_registry() -> StoreRegistry {
    let mut factories: BTreeMap<&'static str, StoreFactory> = BTreeMap::new();
    factories.insert("memory", Box::new(|_| Ok(Arc::new(MemoryStore::new()))));
    factories.insert("sqlite", Box::new(sqlite_factory));
    StoreRegistry { factories }
}
