//! Persistent credential material: token, refresh token, cached user.
//!
//! ERROR HANDLING
//! ==============
//! Writes are best-effort. A backend that rejects a write (quota, privacy
//! mode) is logged and otherwise ignored, so the session degrades to
//! memory-only for that value instead of failing the caller. No validation
//! happens here; that is the probe's job.

#[cfg(test)]
#[path = "token_store_test.rs"]
mod token_store_test;

use std::rc::Rc;

use crate::net::types::{Credential, UserRecord};
use crate::util::storage::KeyValueStore;

/// Logical keys owned by the token store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Token,
    RefreshToken,
    User,
}

impl StorageKey {
    pub const ALL: [StorageKey; 3] = [StorageKey::Token, StorageKey::RefreshToken, StorageKey::User];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::RefreshToken => "refreshToken",
            Self::User => "user",
        }
    }
}

#[derive(Clone)]
pub struct TokenStore {
    backend: Rc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(backend: Rc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn get(&self, key: StorageKey) -> Option<String> {
        self.backend.get(key.as_str())
    }

    pub fn set(&self, key: StorageKey, value: &str) {
        if let Err(e) = self.backend.set(key.as_str(), value) {
            log::warn!("token store: write of {} not persisted: {e}", key.as_str());
        }
    }

    pub fn remove(&self, key: StorageKey) {
        if let Err(e) = self.backend.remove(key.as_str()) {
            log::warn!("token store: removal of {} not persisted: {e}", key.as_str());
        }
    }

    /// Stored bearer token, ignoring blank values.
    pub fn token(&self) -> Option<String> {
        self.get(StorageKey::Token).filter(|t| !t.trim().is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get(StorageKey::RefreshToken).filter(|t| !t.trim().is_empty())
    }

    pub fn credential(&self) -> Option<Credential> {
        self.token().map(|token| Credential { token, refresh_token: self.refresh_token() })
    }

    /// Persist a credential. A missing refresh token removes any stale one.
    pub fn store_credential(&self, credential: &Credential) {
        self.set(StorageKey::Token, &credential.token);
        match credential.refresh_token.as_deref() {
            Some(refresh) => self.set(StorageKey::RefreshToken, refresh),
            None => self.remove(StorageKey::RefreshToken),
        }
    }

    /// Last cached user. An unparsable entry reads as absent.
    pub fn cached_user(&self) -> Option<UserRecord> {
        let raw = self.get(StorageKey::User)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                log::warn!("token store: cached user is unreadable: {e}");
                None
            }
        }
    }

    pub fn store_user(&self, user: &UserRecord) {
        match serde_json::to_string(user) {
            Ok(raw) => self.set(StorageKey::User, &raw),
            Err(e) => log::warn!("token store: user not serializable: {e}"),
        }
    }

    /// Remove token, refresh token, and cached user.
    pub fn clear(&self) {
        for key in StorageKey::ALL {
            self.remove(key);
        }
    }
}
