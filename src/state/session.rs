//! Authentication state machine for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route guards and user-aware components read [`SessionState`]; the
//! [`Session`] handle owns it, drives transitions through login, logout and
//! verification, and notifies subscribers after every change.
//!
//! DESIGN
//! ======
//! States: `Unknown` (before the first check), `Verifying`, `Authenticated`,
//! `Unauthenticated`. Implicit checks are throttled to one per
//! `SessionConfig::throttle`. Overlapping verifications are allowed when
//! forced and the last one to finish wins, except that a verdict started
//! before a login or logout is discarded instead of overwriting it.
//!
//! Phase follows the user, not the verdict: a credential the backend accepts
//! without naming a user, with no cached user to fall back on, still lands in
//! `Unauthenticated` (with a warning), since nothing can be authorized
//! without an identity.
//!
//! The state lives in a `RefCell` that is never borrowed across an `.await`;
//! the probe call is the only suspension point.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::config::SessionConfig;
use crate::error::LoginError;
use crate::net::transport::{AuthTransport, BrowserTransport, bearer_header};
use crate::net::types::{LoginPayload, UserRecord};
use crate::state::probe::{InvalidReason, SessionProbe, Verdict, VerifiedVia};
use crate::state::token_store::TokenStore;
use crate::util::clock::{Clock, SystemClock};
use crate::util::navigation::{BrowserNavigator, Navigator, return_path_from_query, sanitize_return_path};
use crate::util::schedule::{BrowserScheduler, Scheduler, TaskHandle};
use crate::util::storage::{BrowserStorage, KeyValueStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Unknown,
    Verifying,
    Authenticated,
    Unauthenticated,
}

/// Snapshot of the authentication state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<UserRecord>,
    /// True while a verification is in flight.
    pub loading: bool,
    /// False only until the first verification completes.
    pub auth_checked: bool,
    /// Completion time of the last verification, in epoch milliseconds.
    pub last_verified_at: Option<i64>,
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.loading {
            SessionPhase::Verifying
        } else if !self.auth_checked {
            SessionPhase::Unknown
        } else if self.user.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Unauthenticated
        }
    }

    /// Enter `Verifying`. Before the first check a cached user is shown
    /// while the probe runs.
    fn begin_verification(&mut self, cached: Option<UserRecord>) {
        if !self.auth_checked && self.user.is_none() {
            self.user = cached;
        }
        self.loading = true;
    }

    fn apply_verdict(&mut self, verdict: &Verdict, now_ms: i64, still_loading: bool) {
        match verdict {
            Verdict::Valid { user: Some(user), .. } => self.user = Some(user.clone()),
            Verdict::Valid { user: None, .. } | Verdict::Inconclusive { .. } => {}
            Verdict::Invalid { .. } => self.user = None,
        }
        self.auth_checked = true;
        self.loading = still_loading;
        self.last_verified_at = Some(now_ms);
    }

    fn sign_in(&mut self, user: UserRecord, now_ms: i64) {
        self.user = Some(user);
        self.loading = false;
        self.auth_checked = true;
        self.last_verified_at = Some(now_ms);
    }

    fn sign_out(&mut self) {
        self.user = None;
        self.loading = false;
        self.auth_checked = true;
        self.last_verified_at = None;
    }

    /// Verdict implied by the current state, returned for throttled checks.
    fn cached_verdict(&self) -> Verdict {
        match &self.user {
            Some(user) => Verdict::Valid { user: Some(user.clone()), via: VerifiedVia::Cache },
            None => Verdict::Invalid { reason: InvalidReason::NoSession, status: None },
        }
    }
}

type Listener = Rc<dyn Fn(&SessionState)>;

struct SessionInner {
    config: SessionConfig,
    tokens: TokenStore,
    probe: SessionProbe,
    clock: Rc<dyn Clock>,
    scheduler: Rc<dyn Scheduler>,
    navigator: Rc<dyn Navigator>,
    state: RefCell<SessionState>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_listener_id: Cell<u64>,
    pending_redirect: RefCell<Option<TaskHandle>>,
    in_flight: Cell<u32>,
    /// Bumped by login and logout so stale verdicts can be recognized.
    generation: Cell<u64>,
}

/// Shared handle to the session. Cloning is cheap and every clone sees the
/// same state.
#[derive(Clone)]
pub struct Session {
    inner: Rc<SessionInner>,
}

pub struct SessionBuilder {
    config: SessionConfig,
    storage: Option<Rc<dyn KeyValueStore>>,
    transport: Option<Rc<dyn AuthTransport>>,
    clock: Option<Rc<dyn Clock>>,
    scheduler: Option<Rc<dyn Scheduler>>,
    navigator: Option<Rc<dyn Navigator>>,
}

impl SessionBuilder {
    #[must_use]
    pub fn storage(mut self, storage: Rc<dyn KeyValueStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: Rc<dyn AuthTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn scheduler(mut self, scheduler: Rc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    #[must_use]
    pub fn navigator(mut self, navigator: Rc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Missing capabilities default to their browser implementations.
    pub fn build(self) -> Session {
        let storage = self.storage.unwrap_or_else(|| Rc::new(BrowserStorage));
        let transport = self
            .transport
            .unwrap_or_else(|| Rc::new(BrowserTransport::new(self.config.request_timeout_ms)));
        let clock = self.clock.unwrap_or_else(|| Rc::new(SystemClock));
        let scheduler = self.scheduler.unwrap_or_else(|| Rc::new(BrowserScheduler));
        let navigator = self.navigator.unwrap_or_else(|| Rc::new(BrowserNavigator));

        let tokens = TokenStore::new(storage);
        let probe = SessionProbe::new(tokens.clone(), transport, clock.clone(), &self.config);

        Session {
            inner: Rc::new(SessionInner {
                config: self.config,
                tokens,
                probe,
                clock,
                scheduler,
                navigator,
                state: RefCell::new(SessionState::default()),
                listeners: RefCell::new(Vec::new()),
                next_listener_id: Cell::new(0),
                pending_redirect: RefCell::new(None),
                in_flight: Cell::new(0),
                generation: Cell::new(0),
            }),
        }
    }
}

impl Session {
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder { config, storage: None, transport: None, clock: None, scheduler: None, navigator: None }
    }

    /// Session wired to `localStorage`, `fetch`, `setTimeout` and `window.location`.
    pub fn browser(config: SessionConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn user(&self) -> Option<UserRecord> {
        self.inner.state.borrow().user.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.state.borrow().is_logged_in()
    }

    /// `Authorization` header value for other API callers sharing the credential.
    pub fn bearer_header(&self) -> Option<String> {
        self.inner.tokens.token().map(|token| bearer_header(&token))
    }

    /// Register a listener called with the new state after every transition.
    /// The listener stays registered until the returned handle is dropped.
    pub fn subscribe(&self, listener: impl Fn(&SessionState) + 'static) -> Subscription {
        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::new(listener)));
        Subscription { session: Rc::downgrade(&self.inner), id }
    }

    fn update(&self, change: impl FnOnce(&mut SessionState)) {
        let snapshot = {
            let mut state = self.inner.state.borrow_mut();
            change(&mut state);
            state.clone()
        };
        let listeners: Vec<Listener> = self.inner.listeners.borrow().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    /// Startup verification (`Unknown → Verifying`). Never throttled.
    pub async fn initialize(&self) -> Verdict {
        self.verify(true).await
    }

    /// Re-verify unless the last verification is younger than the throttle
    /// window or one is already running; then the current state is returned
    /// as a [`VerifiedVia::Cache`] or [`InvalidReason::NoSession`] verdict.
    pub async fn refresh_auth(&self) -> Verdict {
        self.verify(false).await
    }

    /// Re-verify regardless of throttling.
    pub async fn force_refresh(&self) -> Verdict {
        self.verify(true).await
    }

    fn is_throttled(&self, state: &SessionState, now_ms: i64) -> bool {
        if state.loading {
            return true;
        }
        let window_ms = i64::try_from(self.inner.config.throttle.as_millis()).unwrap_or(i64::MAX);
        state.last_verified_at.is_some_and(|at| now_ms.saturating_sub(at) < window_ms)
    }

    async fn verify(&self, force: bool) -> Verdict {
        let now_ms = self.inner.clock.now_ms();
        {
            let state = self.inner.state.borrow();
            if !force && self.is_throttled(&state, now_ms) {
                log::debug!("session: verification throttled");
                return state.cached_verdict();
            }
        }

        let generation = self.inner.generation.get();
        let cached = self.inner.probe.cached_user();
        self.inner.in_flight.set(self.inner.in_flight.get() + 1);
        self.update(|s| s.begin_verification(cached));

        let verdict = self.inner.probe.verify().await;

        let remaining = self.inner.in_flight.get().saturating_sub(1);
        self.inner.in_flight.set(remaining);
        if self.inner.generation.get() == generation {
            let finished_at = self.inner.clock.now_ms();
            self.update(|s| s.apply_verdict(&verdict, finished_at, remaining > 0));
            if verdict.is_valid() && self.inner.state.borrow().user.is_none() {
                log::warn!("session: credential accepted but no user identity is known; treating as signed out");
            }
        } else {
            log::debug!("session: discarding verdict that predates a login or logout");
            self.update(|s| s.loading = remaining > 0);
        }
        verdict
    }

    /// Store a fresh credential and user and enter `Authenticated`.
    ///
    /// Cancels any redirect still pending from an earlier logout.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::MissingToken`] without touching state when the
    /// payload carries no usable token.
    pub fn login(&self, payload: LoginPayload) -> Result<UserRecord, LoginError> {
        let (credential, user) = payload.into_parts().inspect_err(|e| log::warn!("session: login refused: {e}"))?;

        self.bump_generation();
        self.cancel_pending_redirect();
        self.inner.tokens.store_credential(&credential);
        self.inner.tokens.store_user(&user);
        let now_ms = self.inner.clock.now_ms();
        let signed_in = user.clone();
        self.update(|s| s.sign_in(signed_in, now_ms));
        log::info!("session: logged in as {}", user.id);
        Ok(user)
    }

    /// [`Session::login`] for a raw JSON login response.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::Malformed`] for a non-object payload, otherwise
    /// whatever [`Session::login`] returns.
    pub fn login_json(&self, payload: serde_json::Value) -> Result<UserRecord, LoginError> {
        self.login(LoginPayload::from_json(payload)?)
    }

    /// Clear credential, user and flags, then schedule the redirect to the
    /// login view. Storage failures are swallowed.
    pub fn logout(&self) {
        self.bump_generation();
        self.inner.tokens.clear();
        self.update(SessionState::sign_out);
        log::info!("session: logged out");

        let navigator = self.inner.navigator.clone();
        let login_path = self.inner.config.login_path.clone();
        let handle = self
            .inner
            .scheduler
            .schedule(self.inner.config.logout_redirect_delay, Box::new(move || navigator.redirect(&login_path)));
        if let Some(previous) = self.inner.pending_redirect.replace(Some(handle)) {
            previous.cancel();
        }
    }

    /// Where to go after a successful login, read from the login page's
    /// query string. Anything but a same-origin path yields the home path.
    pub fn return_destination(&self, query: &str) -> String {
        let requested = return_path_from_query(query);
        sanitize_return_path(requested.as_deref(), &self.inner.config.home_path).to_owned()
    }

    /// Cancel a scheduled post-logout redirect, e.g. on component teardown.
    pub fn cancel_pending_redirect(&self) {
        if let Some(handle) = self.inner.pending_redirect.borrow_mut().take() {
            handle.cancel();
        }
    }

    pub fn has_pending_redirect(&self) -> bool {
        self.inner.pending_redirect.borrow().as_ref().is_some_and(TaskHandle::is_pending)
    }

    /// Edit the signed-in user in place and write it through to storage.
    /// Returns `false` when nobody is signed in.
    pub fn update_user(&self, edit: impl FnOnce(&mut UserRecord)) -> bool {
        let mut edited = None;
        self.update(|s| {
            if let Some(user) = s.user.as_mut() {
                edit(user);
                edited = Some(user.clone());
            }
        });
        match edited {
            Some(user) => {
                self.inner.tokens.store_user(&user);
                true
            }
            None => false,
        }
    }

    fn bump_generation(&self) {
        self.inner.generation.set(self.inner.generation.get() + 1);
    }
}

/// Listener registration. Dropping it unsubscribes.
pub struct Subscription {
    session: Weak<SessionInner>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.session.upgrade() {
            inner.listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}
