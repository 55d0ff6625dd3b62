//! Authenticated encryption using AES-256-GCM.
//!
//! Every call to [`encrypt`] draws a fresh random 96-bit IV. Decryption
//! collapses every failure into `AuthenticationFailed`; a wrong key and a
//! corrupted record look the same to the caller.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

use crate::keys::SessionKey;
use nightops_common::{Error, Result};

/// IV size for AES-GCM (12 bytes).
pub const IV_SIZE: usize = 12;

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Output of a single encryption: the IV and the ciphertext with its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    /// Random IV used for this payload.
    pub iv: [u8; IV_SIZE],
    /// Ciphertext followed by the 16-byte tag.
    pub ciphertext: Vec<u8>,
}

/// Draw a random IV from the operating system RNG.
pub fn generate_iv() -> Result<[u8; IV_SIZE]> {
    let mut iv = [0u8; IV_SIZE];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| Error::CryptoUnavailable(format!("System RNG failed: {}", e)))?;
    Ok(iv)
}

fn cipher_for(key: &SessionKey) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| Error::CryptoUnavailable(format!("AES-256-GCM init failed: {}", e)))
}

/// Encrypt a text payload under the session key.
///
/// # Postconditions
/// - The IV is freshly random for this call
/// - `ciphertext.len() == plaintext.len() + TAG_SIZE`
///
/// # Errors
/// - `CryptoUnavailable` if the RNG or cipher cannot be used
pub fn encrypt(key: &SessionKey, plaintext: &str) -> Result<SealedPayload> {
    let cipher = cipher_for(key)?;
    let iv = generate_iv()?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
        .map_err(|e| Error::CryptoUnavailable(format!("Encryption failed: {}", e)))?;

    Ok(SealedPayload { iv, ciphertext })
}

/// Verify and decrypt a payload back into text.
///
/// # Errors
/// - `AuthenticationFailed` for a wrong key, tampered data, a malformed IV,
///   a truncated ciphertext, or a body that is not valid UTF-8
pub fn decrypt(key: &SessionKey, iv: &[u8], ciphertext: &[u8]) -> Result<String> {
    if iv.len() != IV_SIZE || ciphertext.len() < TAG_SIZE {
        return Err(Error::AuthenticationFailed);
    }

    let cipher = cipher_for(key)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| Error::AuthenticationFailed)?;

    String::from_utf8(plaintext).map_err(|e| {
        let mut bytes = e.into_bytes();
        bytes.zeroize();
        Error::AuthenticationFailed
    })
}
