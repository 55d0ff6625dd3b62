//! Record storage for NightOps.
//!
//! This module provides a trait-based interface over durable record stores,
//! the built-in backends selectable by name, and the plain
//! settings store that holds the key-derivation salt.
//!
//! # Design Principles
//! - Crypto isolation: stores only ever see opaque ciphertext
//! - Async operations: all store calls are async
//! - Versioned schema: every store runs the migration chain on open
//! - Unified error semantics: backend failures surface as `StorageUnavailable`

pub mod memory;
pub mod migrations;
pub mod registry;
pub mod settings;
pub mod sqlite;
pub mod store;

pub use memory::MemoryStore;
pub use migrations::SCHEMA_VERSION;
pub use registry::{create_default_registry, StoreFactory, StoreRegistry};
pub use settings::{FileSettings, MemorySettings, SettingsStore, SALT_KEY};
pub use sqlite::SqliteStore;
pub use store::RecordStore;
