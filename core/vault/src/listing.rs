//! Per-record listing results.

use nightops_common::Record;

/// Placeholder shown for records listed without a key.
pub const LOCKED_PLACEHOLDER: &str = "(locked)";

/// Placeholder shown for records that failed to decrypt.
pub const AUTH_FAILED_PLACEHOLDER: &str = "🔒 (wrong passphrase?)";

/// Outcome of decrypting one record during a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordBody {
    /// Plaintext recovered under the session key.
    Decrypted(String),
    /// No session key was available.
    Locked,
    /// Wrong key or corrupted data; the two are indistinguishable.
    AuthFailed,
}

impl RecordBody {
    /// Text to display for this body.
    pub fn display_text(&self) -> &str {
        match self {
            RecordBody::Decrypted(text) => text,
            RecordBody::Locked => LOCKED_PLACEHOLDER,
            RecordBody::AuthFailed => AUTH_FAILED_PLACEHOLDER,
        }
    }

    /// The decrypted text, if any.
    pub fn plaintext(&self) -> Option<&str> {
        match self {
            RecordBody::Decrypted(text) => Some(text),
            _ => None,
        }
    }

    /// Whether this body survives a search filter.
    ///
    /// A blank (or absent) filter keeps everything. Otherwise only decrypted
    /// bodies containing the filter, ignoring case, are kept.
    pub fn matches(&self, filter: Option<&str>) -> bool {
        let needle = match filter.map(str::trim) {
            Some(f) if !f.is_empty() => f.to_lowercase(),
            _ => return true,
        };
        self.plaintext()
            .map(|text| text.to_lowercase().contains(&needle))
            .unwrap_or(false)
    }
}

/// One row of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// The stored record, still encrypted.
    pub record: Record,
    /// What decrypting it produced.
    pub body: RecordBody,
}

impl ListEntry {
    /// Text to display for this row; see [`RecordBody::display_text`].
    pub fn display_text(&self) -> &str {
        self.body.display_text()
    }
}
