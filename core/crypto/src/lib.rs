//! Cryptographic primitives for NightOps.
//!
//! This module provides:
//! - Key derivation using PBKDF2-HMAC-SHA256
//! - Authenticated encryption of record bodies using AES-256-GCM
//! - Session key handling with automatic zeroization
//!
//! # Security Guarantees
//! - Key material is zeroized on drop
//! - No plaintext or key material is ever logged

pub mod aead;
pub mod kdf;
pub mod keys;

pub use aead::{decrypt, encrypt, SealedPayload, IV_SIZE, TAG_SIZE};
pub use kdf::{derive_key, KdfParams};
pub use keys::{Salt, SessionKey, KEY_LENGTH, SALT_LENGTH};
