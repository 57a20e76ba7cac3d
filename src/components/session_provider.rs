//! Session context for the component tree.
//!
//! SYSTEM CONTEXT
//! ==============
//! Mounted once near the root. Provides [`SessionContext`] so guards and
//! user-aware components can read a reactive mirror of the session state
//! and reach the [`Session`] handle for login and logout.
//!
//! DESIGN
//! ======
//! `Session` is single-threaded (`Rc` inside), so it is kept in a local
//! `StoredValue`. The `RwSignal<SessionState>` mirror is fed by a session
//! subscription whose lifetime is tied to the provider's owner.

use leptos::prelude::*;

use crate::config::SessionConfig;
use crate::state::guard::{RouteDecision, RouteGuard};
use crate::state::session::{Session, SessionState};

#[derive(Clone, Copy)]
pub struct SessionContext {
    session: StoredValue<Session, LocalStorage>,
    guard: StoredValue<RouteGuard>,
    pub state: RwSignal<SessionState>,
}

impl SessionContext {
    pub fn session(&self) -> Session {
        self.session.get_value()
    }

    /// Guard decision for `path`. Tracks the state signal.
    pub fn decide(&self, path: &str) -> RouteDecision {
        let state = self.state.get();
        self.guard.with_value(|guard| guard.decide(path, &state))
    }

    pub fn redirect_target(&self, decision: &RouteDecision) -> Option<String> {
        self.guard.with_value(|guard| guard.redirect_target(decision))
    }

    pub fn is_logged_in(&self) -> Signal<bool> {
        let state = self.state;
        Signal::derive(move || state.with(SessionState::is_logged_in))
    }
}

/// Provides the session context and starts the startup verification.
///
/// Without `session` a browser session is built from `config`, or from the
/// build-time configuration when that is absent too. Without `guard` the
/// default route classification is used.
#[component]
pub fn SessionProvider(
    #[prop(optional)] session: Option<Session>,
    #[prop(optional)] config: Option<SessionConfig>,
    #[prop(optional)] guard: Option<RouteGuard>,
    children: Children,
) -> impl IntoView {
    let session = session.unwrap_or_else(|| Session::browser(config.unwrap_or_else(SessionConfig::load)));
    let guard = guard.unwrap_or_else(|| RouteGuard::new(session.config()));

    let state = RwSignal::new(session.state());
    let subscription = session.subscribe(move |next| state.set(next.clone()));
    let _subscription = StoredValue::new_local(subscription);

    let context = SessionContext {
        session: StoredValue::new_local(session.clone()),
        guard: StoredValue::new(guard),
        state,
    };
    provide_context(context);

    let stored = context.session;
    on_cleanup(move || {
        if let Some(session) = stored.try_get_value() {
            session.cancel_pending_redirect();
        }
    });

    #[cfg(feature = "hydrate")]
    {
        leptos::task::spawn_local(async move {
            session.initialize().await;
        });
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = session;
    }

    view! { {children()} }
}

/// The session context provided by [`SessionProvider`].
///
/// # Panics
///
/// Panics when called outside a `SessionProvider`.
pub fn use_session() -> SessionContext {
    expect_context::<SessionContext>()
}
