//! Key derivation using PBKDF2-HMAC-SHA256.
//!
//! The derived key is bound to AES-256-GCM use. Derivation is deliberately
//! slow and fully deterministic: the same passphrase and salt always yield
//! the same key, which is what keeps older records decryptable.

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::keys::{Salt, SessionKey, KEY_LENGTH};
use nightops_common::{Error, Result};

/// Parameters for PBKDF2 key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Number of HMAC-SHA256 iterations.
    pub iterations: u32,
}

impl KdfParams {
    /// Lowest iteration count accepted by configuration validation.
    pub const MIN_ITERATIONS: u32 = 120_000;

    /// Default parameters for interactive unlock.
    pub fn standard() -> Self {
        Self {
            iterations: Self::MIN_ITERATIONS,
        }
    }

    /// Higher cost for slower devices that can afford it.
    pub fn hardened() -> Self {
        Self {
            iterations: 600_000,
        }
    }

    /// Explicit iteration count, bypassing the minimum.
    ///
    /// Intended for tests; production configuration goes through
    /// [`KdfParams::validate`].
    pub fn with_iterations(iterations: u32) -> Self {
        Self { iterations }
    }

    /// Check that the parameters meet the minimum cost.
    pub fn validate(&self) -> Result<()> {
        if self.iterations < Self::MIN_ITERATIONS {
            return Err(Error::InvalidInput(format!(
                "KDF iterations must be at least {}, got {}",
                Self::MIN_ITERATIONS,
                self.iterations
            )));
        }
        Ok(())
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::standard()
    }
}

/// Derive a session key from a passphrase and salt.
///
/// # Preconditions
/// - `passphrase` must not be empty
/// - `params.iterations` must be positive
///
/// # Postconditions
/// - Returns a 256-bit SessionKey
/// - The derived key is deterministic given the same inputs
///
/// # Errors
/// - `UnlockFailed` if the passphrase is empty or the iteration count is zero
///
/// # Security
/// - Passphrase is not stored or logged
/// - Intermediate key buffer is zeroized
pub fn derive_key(passphrase: &[u8], salt: &Salt, params: &KdfParams) -> Result<SessionKey> {
    if passphrase.is_empty() {
        return Err(Error::UnlockFailed("Passphrase cannot be empty".to_string()));
    }
    if params.iterations == 0 {
        return Err(Error::UnlockFailed(
            "Iteration count must be positive".to_string(),
        ));
    }

    let mut key_bytes = Zeroizing::new([0u8; KEY_LENGTH]);
    pbkdf2_hmac::<Sha256>(
        passphrase,
        salt.as_bytes(),
        params.iterations,
        key_bytes.as_mut_slice(),
    );

    Ok(SessionKey::from_bytes(*key_bytes))
}
