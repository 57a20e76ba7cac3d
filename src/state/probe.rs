//! Verification of the stored credential against the remote authority.
//!
//! DESIGN
//! ======
//! Candidate endpoints form an ordered strategy list. Each attempt is reduced
//! to one [`Attempt`] and the loop stops at the first definitive answer, so a
//! `401` from endpoint *k* can never be overtaken by a later endpoint.
//!
//! TRADE-OFFS
//! ==========
//! Only a `401` clears credentials, and only if the stored token is still
//! the one that was sent. Every other failure (network, timeout,
//! 5xx, malformed body) is inconclusive, and when nothing answered the probe
//! falls back to reading the token's `exp` claim locally. A backend outage
//! therefore never logs anybody out, at the cost of trusting an unexpired
//! token that the backend may already have revoked.

#[cfg(test)]
#[path = "probe_test.rs"]
mod probe_test;

use std::rc::Rc;

use crate::config::{SessionConfig, SoftRejectPolicy};
use crate::net::transport::{AuthTransport, ProbeReply};
use crate::net::types::{UserRecord, VerifyResponse};
use crate::state::token_store::TokenStore;
use crate::util::clock::Clock;
use crate::util::jwt;

/// Where a positive verdict came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifiedVia {
    /// A verification endpoint accepted the token.
    Endpoint,
    /// No endpoint answered; the token's `exp` claim is still in the future.
    TokenExpiry,
    /// Throttled; the current session state was reused.
    Cache,
}

/// Why a verdict is negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidReason {
    /// Nothing stored; no request was made.
    NoToken,
    /// An endpoint answered `401`. Credentials were cleared.
    Unauthorized,
    /// Endpoints answered `200` with `isAuthenticated: false`.
    Rejected,
    /// No endpoint answered and the token's `exp` has passed.
    Expired,
    /// Throttled; the current session state has no user.
    NoSession,
}

/// Outcome of one verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Valid { user: Option<UserRecord>, via: VerifiedVia },
    Invalid { reason: InvalidReason, status: Option<u16> },
    /// Could not decide. Callers keep whatever session they had.
    Inconclusive { reason: String },
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn is_inconclusive(&self) -> bool {
        matches!(self, Self::Inconclusive { .. })
    }

    /// HTTP status behind a definitive failure (`Some(401)`).
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Invalid { status, .. } => *status,
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            Self::Valid { user, .. } => user.as_ref(),
            _ => None,
        }
    }
}

/// One endpoint's answer, reduced to what the probe loop cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Attempt {
    Accepted(Option<UserRecord>),
    Unauthorized,
    SoftReject,
    Unreachable(String),
}

fn classify(reply: &ProbeReply) -> Attempt {
    match reply.status {
        401 => Attempt::Unauthorized,
        200 => {
            if reply.body.trim().is_empty() {
                return Attempt::Accepted(None);
            }
            match serde_json::from_str::<VerifyResponse>(&reply.body) {
                Ok(body) if body.is_soft_reject() => Attempt::SoftReject,
                Ok(body) => Attempt::Accepted(body.user),
                Err(e) => Attempt::Unreachable(format!("malformed body: {e}")),
            }
        }
        status => Attempt::Unreachable(format!("status {status}")),
    }
}

#[derive(Clone)]
pub struct SessionProbe {
    tokens: TokenStore,
    transport: Rc<dyn AuthTransport>,
    clock: Rc<dyn Clock>,
    endpoints: Vec<String>,
    soft_reject: SoftRejectPolicy,
}

impl SessionProbe {
    pub fn new(
        tokens: TokenStore,
        transport: Rc<dyn AuthTransport>,
        clock: Rc<dyn Clock>,
        config: &SessionConfig,
    ) -> Self {
        let endpoints = config.verify_endpoints.iter().map(|e| config.endpoint_url(e)).collect();
        Self { tokens, transport, clock, endpoints, soft_reject: config.soft_reject }
    }

    /// Last-known identity, available before any request resolves.
    pub fn cached_user(&self) -> Option<UserRecord> {
        self.tokens.cached_user()
    }

    /// Decide whether the stored credential is still good.
    ///
    /// Endpoints are tried strictly in order. The first success wins (and a
    /// returned user is written through to storage); a `401` stops the loop
    /// and clears credentials. When every endpoint is unreachable the token's
    /// expiry is checked locally.
    pub async fn verify(&self) -> Verdict {
        let Some(token) = self.tokens.token() else {
            log::debug!("probe: no stored token");
            return Verdict::Invalid { reason: InvalidReason::NoToken, status: None };
        };
        let cached = self.tokens.cached_user();

        let mut soft_rejected = false;
        let mut last_failure = None;
        for url in &self.endpoints {
            let attempt = match self.transport.get(url, &token).await {
                Ok(reply) => classify(&reply),
                Err(e) => Attempt::Unreachable(e.to_string()),
            };
            match attempt {
                Attempt::Accepted(user) => {
                    log::debug!("probe: {url} accepted the session");
                    if let Some(user) = &user {
                        if self.still_current(&token) {
                            self.tokens.store_user(user);
                        }
                    }
                    return Verdict::Valid { user: user.or(cached), via: VerifiedVia::Endpoint };
                }
                Attempt::Unauthorized => {
                    log::info!("probe: {url} answered 401; clearing credentials");
                    self.clear_if_current(&token);
                    return Verdict::Invalid { reason: InvalidReason::Unauthorized, status: Some(401) };
                }
                Attempt::SoftReject => {
                    if self.soft_reject == SoftRejectPolicy::Terminal {
                        log::info!("probe: {url} rejected the session; clearing credentials");
                        self.clear_if_current(&token);
                        return Verdict::Invalid { reason: InvalidReason::Rejected, status: None };
                    }
                    log::debug!("probe: {url} reported isAuthenticated=false; trying next endpoint");
                    soft_rejected = true;
                }
                Attempt::Unreachable(reason) => {
                    log::warn!("probe: {url} inconclusive: {reason}");
                    last_failure = Some(reason);
                }
            }
        }

        if soft_rejected {
            return Verdict::Invalid { reason: InvalidReason::Rejected, status: None };
        }
        self.verify_locally(&token, cached, last_failure)
    }

    /// Whether storage still holds the token this verification sent. A login
    /// or logout during the request replaces or removes it.
    fn still_current(&self, token: &str) -> bool {
        self.tokens.token().as_deref() == Some(token)
    }

    fn clear_if_current(&self, token: &str) {
        if self.still_current(token) {
            self.tokens.clear();
        } else {
            log::debug!("probe: stored credential changed during verification; leaving storage alone");
        }
    }

    fn verify_locally(&self, token: &str, cached: Option<UserRecord>, last_failure: Option<String>) -> Verdict {
        match jwt::is_unexpired(token, self.clock.now_ms()) {
            Ok(true) => {
                log::info!("probe: no endpoint reachable; token unexpired, keeping session");
                Verdict::Valid { user: cached, via: VerifiedVia::TokenExpiry }
            }
            Ok(false) => {
                log::info!("probe: no endpoint reachable and token expired");
                Verdict::Invalid { reason: InvalidReason::Expired, status: None }
            }
            Err(e) => {
                let reason = match last_failure {
                    Some(failure) => format!("{failure}; token not decodable: {e}"),
                    None => format!("no endpoints configured; token not decodable: {e}"),
                };
                Verdict::Inconclusive { reason }
            }
        }
    }
}
