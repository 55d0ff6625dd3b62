//! Key namespace policy.
//!
//! The decoy namespace is a passphrase transform: the same passphrase under a
//! different namespace derives an unrelated key over the same salt. It hides
//! nothing from an attacker who knows the prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Prefix applied to passphrases in the decoy namespace.
pub const DEFAULT_DECOY_PREFIX: &str = "decoy:";

/// Which key namespace an unlock derives into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyNamespace {
    #[default]
    Primary,
    Decoy,
}

impl KeyNamespace {
    /// Transform a passphrase into this namespace.
    pub fn apply(&self, passphrase: &str, decoy_prefix: &str) -> Zeroizing<String> {
        match self {
            KeyNamespace::Primary => Zeroizing::new(passphrase.to_string()),
            KeyNamespace::Decoy => Zeroizing::new(format!("{}{}", decoy_prefix, passphrase)),
        }
    }

    /// The other namespace.
    pub fn toggled(&self) -> Self {
        match self {
            KeyNamespace::Primary => KeyNamespace::Decoy,
            KeyNamespace::Decoy => KeyNamespace::Primary,
        }
    }

    /// Whether this is the decoy namespace.
    pub fn is_decoy(&self) -> bool {
        *self == KeyNamespace::Decoy
    }
}

impl fmt::Display for KeyNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyNamespace::Primary => write!(f, "primary"),
            KeyNamespace::Decoy => write!(f, "decoy"),
        }
    }
}
