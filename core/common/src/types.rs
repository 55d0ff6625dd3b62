//! Common types used throughout NightOps.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generate a fresh random (v4) identifier.
    ///
    /// Ids are high-entropy, not counters, so concurrent saves never collide.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its hyphenated string form.
    ///
    /// # Errors
    /// - Returns error if `s` is not a valid UUID
    pub fn parse(s: &str) -> crate::Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| crate::Error::InvalidInput(format!("Invalid record id: {}", e)))
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named collection inside the vault store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Free-form notes.
    Notes,
    /// Task items.
    Tasks,
    /// Store-level key/value settings, not records.
    Meta,
}

impl Collection {
    /// Collections that hold encrypted records.
    pub const RECORDS: [Collection; 2] = [Collection::Notes, Collection::Tasks];

    /// Every collection provisioned by the store.
    pub const ALL: [Collection; 3] = [Collection::Notes, Collection::Tasks, Collection::Meta];

    /// Storage name of the collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Notes => "notes",
            Collection::Tasks => "tasks",
            Collection::Meta => "meta",
        }
    }

    /// Whether this collection stores [`Record`]s.
    pub fn holds_records(&self) -> bool {
        !matches!(self, Collection::Meta)
    }

    /// Reject `meta` where a record collection is required.
    pub fn ensure_records(&self) -> crate::Result<()> {
        if self.holds_records() {
            Ok(())
        } else {
            Err(crate::Error::InvalidInput(format!(
                "'{}' is not a record collection",
                self
            )))
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "notes" | "note" => Ok(Collection::Notes),
            "tasks" | "task" => Ok(Collection::Tasks),
            "meta" => Ok(Collection::Meta),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown collection: {}",
                other
            ))),
        }
    }
}

/// An encrypted record as persisted by the store.
///
/// The store treats `iv` and `ciphertext` as opaque bytes. In JSON form both
/// are standard base64 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique id within the record's collection.
    pub id: RecordId,
    /// Nonce used for this record's encryption.
    #[serde(with = "base64_bytes")]
    pub iv: Vec<u8>,
    /// AEAD output (ciphertext followed by tag).
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
    /// Write timestamp in Unix milliseconds; the ordering key.
    pub updated_at_ms: i64,
}

impl Record {
    /// Build a new record with a fresh id.
    pub fn new(iv: Vec<u8>, ciphertext: Vec<u8>, updated_at_ms: i64) -> Self {
        Self {
            id: RecordId::new(),
            iv,
            ciphertext,
            updated_at_ms,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
