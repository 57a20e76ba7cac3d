//! Client-side session core for the storefront.
//!
//! SYSTEM CONTEXT
//! ==============
//! Decides, on every navigation, whether the browser user is authenticated
//! and allowed to see a route. The credential lives in browser storage, the
//! backend is asked to confirm it through an ordered list of verification
//! endpoints, and the result drives a small state machine that route guards
//! read.
//!
//! Layout:
//! - `state`: token store, verification probe, session state machine, guard.
//! - `net`: wire types and the HTTP transport.
//! - `util`: storage, clock, timers, navigation, JWT expiry decoding.
//! - `components`: Leptos provider and route wrapper.
//!
//! Everything outside `components` is plain Rust and runs natively, which is
//! how the tests drive it.

pub mod components;
pub mod config;
pub mod error;
pub mod net;
pub mod state;
pub mod util;

pub use components::route_guard::RequireSession;
pub use components::session_provider::{SessionContext, SessionProvider, use_session};
pub use config::{SessionConfig, SoftRejectPolicy};
pub use error::{ConfigError, LoginError, StorageError, TokenDecodeError, TransportError};
pub use net::types::{Credential, LoginPayload, Role, UserRecord};
pub use state::guard::{AccessRule, Capability, RouteDecision, RouteGuard};
pub use state::probe::{InvalidReason, SessionProbe, Verdict, VerifiedVia};
pub use state::session::{Session, SessionBuilder, SessionPhase, SessionState, Subscription};
pub use state::token_store::TokenStore;

/// Route `log` output to the browser console and install the panic hook.
#[cfg(feature = "hydrate")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Debug).is_err() {
        log::debug!("logger already installed");
    }
}
