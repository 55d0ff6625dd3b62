//! Vault session management.
//!
//! A session holds the derived key in memory for as long as the vault is
//! unlocked. The key is zeroized when the session is locked or dropped.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::namespace::KeyNamespace;
use nightops_common::{Error, Result};
use nightops_crypto::SessionKey;

/// Opaque handle identifying one successful unlock.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle(Uuid);

impl SessionHandle {
    /// Generate a new unique session handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of the vault session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Key is available.
    Active,
    /// Key has been cleared.
    Locked,
}

/// Snapshot of the active session for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub handle: SessionHandle,
    /// Namespace the key was derived in.
    pub namespace: KeyNamespace,
    /// When the key was derived.
    pub unlocked_at: DateTime<Utc>,
}

/// Unlocked vault session.
pub struct VaultSession {
    handle: SessionHandle,
    namespace: KeyNamespace,
    key: Option<SessionKey>,
    unlocked_at: DateTime<Utc>,
    state: SessionState,
}

impl VaultSession {
    /// Wrap a freshly derived key.
    pub fn new(key: SessionKey, namespace: KeyNamespace) -> Self {
        Self {
            handle: SessionHandle::new(),
            namespace,
            key: Some(key),
            unlocked_at: Utc::now(),
            state: SessionState::Active,
        }
    }

    /// Handle returned to the caller of `unlock`.
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Describe this session, or `None` once it has been locked.
    pub fn info(&self) -> Option<SessionInfo> {
        self.is_active().then(|| SessionInfo {
            handle: self.handle.clone(),
            namespace: self.namespace,
            unlocked_at: self.unlocked_at,
        })
    }

    /// Get the session key.
    ///
    /// # Errors
    /// - `NotUnlocked` if the session has been locked
    pub fn key(&self) -> Result<&SessionKey> {
        match self.state {
            SessionState::Active => self.key.as_ref().ok_or(Error::NotUnlocked),
            SessionState::Locked => Err(Error::NotUnlocked),
        }
    }

    /// Whether the key is still held.
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Clear the key from memory.
    pub fn lock(&mut self) {
        // SessionKey zeroizes on drop.
        self.key.take();
        self.state = SessionState::Locked;
    }
}

impl Drop for VaultSession {
    fn drop(&mut self) {
        self.lock();
    }
}
