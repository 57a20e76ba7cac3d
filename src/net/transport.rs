//! HTTP access to the remote authority used by the session probe.
//!
//! Client-side (hydrate): real `GET` calls via `gloo-net` with an abort-based
//! timeout. Anywhere else the browser transport reports
//! [`TransportError::Unavailable`], which the probe treats as inconclusive.
//!
//! ERROR HANDLING
//! ==============
//! The transport never interprets status codes. It hands back the raw status
//! and body so the probe alone decides what is definitive and what is not.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use crate::error::TransportError;

/// Raw reply from one verification endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeReply {
    pub status: u16,
    pub body: String,
}

impl ProbeReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

/// Issues `GET <url>` with `Authorization: Bearer <token>`.
#[async_trait::async_trait(?Send)]
pub trait AuthTransport {
    /// Fetch one verification endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no HTTP status was obtained at all.
    async fn get(&self, url: &str, token: &str) -> Result<ProbeReply, TransportError>;
}

/// Value of the `Authorization` header for a stored token.
pub fn bearer_header(token: &str) -> String {
    format!("Bearer {token}")
}

#[cfg(any(test, feature = "hydrate"))]
fn classify_request_error(message: &str, timeout_ms: u32) -> TransportError {
    let lowered = message.to_lowercase();
    if lowered.contains("timeout") || lowered.contains("abort") {
        TransportError::Timeout { timeout_ms }
    } else {
        TransportError::Network(message.to_owned())
    }
}

/// Pair a status with its body. A body that fails to arrive is a transport
/// failure, not an empty success.
#[cfg(any(test, feature = "hydrate"))]
fn read_reply(status: u16, body: Result<String, String>, timeout_ms: u32) -> Result<ProbeReply, TransportError> {
    body.map(|body| ProbeReply { status, body })
        .map_err(|e| classify_request_error(&format!("body read failed: {e}"), timeout_ms))
}

/// Browser transport backed by `fetch`.
#[derive(Clone, Copy, Debug)]
pub struct BrowserTransport {
    timeout_ms: u32,
}

impl BrowserTransport {
    pub fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }
}

#[async_trait::async_trait(?Send)]
impl AuthTransport for BrowserTransport {
    async fn get(&self, url: &str, token: &str) -> Result<ProbeReply, TransportError> {
        #[cfg(feature = "hydrate")]
        {
            let controller =
                web_sys::AbortController::new().map_err(|_| TransportError::Build("abort controller".to_owned()))?;
            let signal = controller.signal();
            let timeout_controller = controller.clone();
            let _timeout = gloo_timers::callback::Timeout::new(self.timeout_ms, move || timeout_controller.abort());

            let resp = gloo_net::http::Request::get(url)
                .header("Authorization", &bearer_header(token))
                .header("Accept", "application/json")
                .abort_signal(Some(&signal))
                .send()
                .await
                .map_err(|e| classify_request_error(&e.to_string(), self.timeout_ms))?;
            let status = resp.status();
            read_reply(status, resp.text().await.map_err(|e| e.to_string()), self.timeout_ms)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (url, token, self.timeout_ms);
            Err(TransportError::Unavailable)
        }
    }
}
