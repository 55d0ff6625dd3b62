//! Key types with secure memory handling.
//!
//! The session key zeroizes its memory on drop and never renders its bytes
//! through `Debug`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use nightops_common::{Error, Result};

/// Length of the session key in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Length of the installation salt in bytes.
pub const SALT_LENGTH: usize = 16;

/// In-memory key derived from the user's passphrase.
///
/// Held for the duration of an unlocked session; never persisted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    key: [u8; KEY_LENGTH],
}

impl SessionKey {
    /// Create a session key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey([REDACTED])")
    }
}

/// Per-installation salt for key derivation.
///
/// Public and non-secret; persisted in plain settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salt([u8; SALT_LENGTH]);

impl Salt {
    /// Generate a random salt from the operating system RNG.
    ///
    /// # Errors
    /// - `CryptoUnavailable` if the system RNG cannot be read
    pub fn generate() -> Result<Self> {
        let mut salt = [0u8; SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| Error::CryptoUnavailable(format!("System RNG failed: {}", e)))?;
        Ok(Self(salt))
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; SALT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LENGTH] {
        &self.0
    }

    /// Encode for the plain settings store.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Decode a persisted salt.
    ///
    /// # Errors
    /// - Returns error if the value is not base64 or has the wrong length
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::Serialization(format!("Invalid salt encoding: {}", e)))?;
        let bytes: [u8; SALT_LENGTH] = bytes.try_into().map_err(|v: Vec<u8>| {
            Error::Serialization(format!(
                "Invalid salt length: expected {}, got {}",
                SALT_LENGTH,
                v.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}
