//! Shared fixtures for session-core unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::config::SessionConfig;
use crate::error::TransportError;
use crate::net::transport::{AuthTransport, ProbeReply};
use crate::net::types::{Role, UserRecord};
use crate::state::token_store::TokenStore;
use crate::util::clock::ManualClock;
use crate::util::storage::MemoryStorage;

pub const NOW_MS: i64 = 1_700_000_000_000;

/// Transport answering per URL; unknown URLs fail like a dropped connection.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<HashMap<String, Result<ProbeReply, TransportError>>>,
    calls: RefCell<Vec<(String, String)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, url: &str, status: u16, body: &str) -> Self {
        self.replies.borrow_mut().insert(url.to_owned(), Ok(ProbeReply::new(status, body)));
        self
    }

    pub fn fail(self, url: &str, error: TransportError) -> Self {
        self.replies.borrow_mut().insert(url.to_owned(), Err(error));
        self
    }

    pub fn set_reply(&self, url: &str, status: u16, body: &str) {
        self.replies.borrow_mut().insert(url.to_owned(), Ok(ProbeReply::new(status, body)));
    }

    /// URLs requested so far, in order.
    pub fn called_urls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn tokens_sent(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(_, token)| token.clone()).collect()
    }
}

#[async_trait::async_trait(?Send)]
impl AuthTransport for ScriptedTransport {
    async fn get(&self, url: &str, token: &str) -> Result<ProbeReply, TransportError> {
        self.calls.borrow_mut().push((url.to_owned(), token.to_owned()));
        self.replies
            .borrow()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::Network("connection refused".to_owned())))
    }
}

/// Runs a hook once before the wrapped transport answers, to interleave a
/// login, logout or storage change with an in-flight request.
pub struct MidFlight {
    inner: ScriptedTransport,
    hook: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl MidFlight {
    pub fn new(inner: ScriptedTransport) -> Self {
        Self { inner, hook: RefCell::new(None) }
    }

    pub fn before_reply(&self, hook: impl FnOnce() + 'static) {
        *self.hook.borrow_mut() = Some(Box::new(hook));
    }
}

#[async_trait::async_trait(?Send)]
impl AuthTransport for MidFlight {
    async fn get(&self, url: &str, token: &str) -> Result<ProbeReply, TransportError> {
        let hook = self.hook.borrow_mut().take();
        if let Some(hook) = hook {
            hook();
        }
        self.inner.get(url, token).await
    }
}

pub fn config_with(endpoints: &[&str]) -> SessionConfig {
    SessionConfig {
        verify_endpoints: endpoints.iter().map(|e| (*e).to_owned()).collect(),
        ..SessionConfig::default()
    }
}

pub fn memory_tokens() -> (Rc<MemoryStorage>, TokenStore) {
    let backend = Rc::new(MemoryStorage::new());
    (backend.clone(), TokenStore::new(backend))
}

pub fn clock() -> Rc<ManualClock> {
    Rc::new(ManualClock::new(NOW_MS))
}

/// Unsigned JWT whose `exp` is `exp_secs`.
pub fn jwt_expiring_at(exp_secs: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::json!({"sub": "u1", "exp": exp_secs}).to_string());
    format!("{header}.{payload}.sig")
}

pub fn jwt_valid_for_an_hour() -> String {
    jwt_expiring_at(NOW_MS / 1000 + 3600)
}

pub fn user(id: &str, role: Role, is_hotel: bool) -> UserRecord {
    UserRecord {
        id: id.to_owned(),
        name: format!("User {id}"),
        email: format!("{id}@example.test"),
        phone: None,
        role,
        is_hotel,
        hotel_id: is_hotel.then(|| format!("hotel-{id}")),
    }
}
