//! Vault engine for NightOps.
//!
//! This module provides:
//! - The `VaultService` façade (unlock, save, list, wipe)
//! - Session handling with in-memory key zeroization
//! - Salt persistence and the decoy key-namespace policy
//! - Configuration for choosing store and settings backends
//!
//! # Architecture
//! The vault sits between the front end and the record store. Stores only
//! ever see ciphertext; all encryption happens here.

pub mod config;
pub mod listing;
pub mod namespace;
pub mod salt;
pub mod service;
pub mod session;

pub use config::{VaultConfig, DATABASE_FILENAME, SETTINGS_FILENAME};
pub use listing::{ListEntry, RecordBody, AUTH_FAILED_PLACEHOLDER, LOCKED_PLACEHOLDER};
pub use namespace::{KeyNamespace, DEFAULT_DECOY_PREFIX};
pub use salt::SaltSource;
pub use service::VaultService;
pub use session::{SessionHandle, SessionInfo, SessionState, VaultSession};
