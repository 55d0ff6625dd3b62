//! Common error types for NightOps.

use thiserror::Error;

/// Top-level error type for NightOps operations.
///
/// The first five variants form the vault's failure taxonomy; the rest cover
/// input validation and serialization at crate seams.
#[derive(Debug, Error)]
pub enum Error {
    /// The host lacks a required cryptographic primitive.
    #[error("Cryptographic backend unavailable: {0}")]
    CryptoUnavailable(String),

    /// Key derivation failed (e.g. empty passphrase).
    #[error("Unlock failed: {0}")]
    UnlockFailed(String),

    /// AEAD verification failed: wrong key, corrupted or tampered data.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// A privileged operation was invoked without a session key.
    #[error("Vault is not unlocked")]
    NotUnlocked,

    /// The storage backend denied or failed an open/read/write/delete.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Whether the user can reasonably retry after this error
    /// (e.g. by re-entering the passphrase).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::UnlockFailed(_) | Error::AuthenticationFailed)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(Error::UnlockFailed("empty".into()).is_recoverable());
        assert!(Error::AuthenticationFailed.is_recoverable());
        assert!(!Error::NotUnlocked.is_recoverable());
        assert!(!Error::StorageUnavailable("denied".into()).is_recoverable());
        assert!(!Error::CryptoUnavailable("no aes".into()).is_recoverable());
    }

    #[test]
    fn test_auth_failure_message_is_generic() {
        // Must not hint at whether the key or the data is at fault.
        assert_eq!(Error::AuthenticationFailed.to_string(), "Authentication failed");
    }
}
