use super::*;
use crate::error::StorageError;
use crate::net::types::Role;
use crate::util::storage::MemoryStorage;

/// Reads work, every write is rejected like a full quota.
struct QuotaExceeded {
    inner: MemoryStorage,
}

impl KeyValueStore for QuotaExceeded {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::WriteRejected { key: key.to_owned(), message: "QuotaExceededError".to_owned() })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        Err(StorageError::WriteRejected { key: key.to_owned(), message: "SecurityError".to_owned() })
    }
}

fn memory_store() -> (Rc<MemoryStorage>, TokenStore) {
    let backend = Rc::new(MemoryStorage::new());
    let store = TokenStore::new(backend.clone());
    (backend, store)
}

fn sample_user() -> UserRecord {
    UserRecord {
        id: "u1".to_owned(),
        name: "Ana".to_owned(),
        email: "ana@example.test".to_owned(),
        role: Role::Seller,
        ..UserRecord::default()
    }
}

#[test]
fn storage_keys_match_persisted_layout() {
    assert_eq!(StorageKey::Token.as_str(), "token");
    assert_eq!(StorageKey::RefreshToken.as_str(), "refreshToken");
    assert_eq!(StorageKey::User.as_str(), "user");
}

#[test]
fn store_credential_writes_both_tokens() {
    let (backend, store) = memory_store();
    store.store_credential(&Credential { token: "t1".to_owned(), refresh_token: Some("r1".to_owned()) });
    assert_eq!(backend.get("token").as_deref(), Some("t1"));
    assert_eq!(backend.get("refreshToken").as_deref(), Some("r1"));
    assert_eq!(store.credential().map(|c| c.token).as_deref(), Some("t1"));
}

#[test]
fn store_credential_without_refresh_removes_stale_refresh() {
    let (backend, store) = memory_store();
    backend.set("refreshToken", "old").unwrap();
    store.store_credential(&Credential { token: "t2".to_owned(), refresh_token: None });
    assert!(backend.get("refreshToken").is_none());
}

#[test]
fn blank_token_reads_as_absent() {
    let (backend, store) = memory_store();
    backend.set("token", "   ").unwrap();
    assert!(store.token().is_none());
    assert!(store.credential().is_none());
}

#[test]
fn cached_user_round_trips() {
    let (_backend, store) = memory_store();
    store.store_user(&sample_user());
    assert_eq!(store.cached_user(), Some(sample_user()));
}

#[test]
fn corrupt_cached_user_reads_as_absent() {
    let (backend, store) = memory_store();
    backend.set("user", "{not json").unwrap();
    assert!(store.cached_user().is_none());
}

#[test]
fn clear_removes_every_key() {
    let (backend, store) = memory_store();
    store.store_credential(&Credential { token: "t".to_owned(), refresh_token: Some("r".to_owned()) });
    store.store_user(&sample_user());
    store.clear();
    assert!(backend.is_empty());
}

#[test]
fn rejected_writes_are_swallowed() {
    let backend = Rc::new(QuotaExceeded { inner: MemoryStorage::new() });
    backend.inner.set("token", "kept").unwrap();
    let store = TokenStore::new(backend.clone());

    store.set(StorageKey::Token, "new");
    store.store_user(&sample_user());
    store.clear();

    assert_eq!(store.token().as_deref(), Some("kept"));
    assert!(store.cached_user().is_none());
}
