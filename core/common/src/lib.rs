//! Common utilities and types shared across NightOps modules.
//!
//! This module provides the error taxonomy and the record model used by the
//! crypto, storage and vault crates.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{now_ms, Collection, Record, RecordId};
