//! Per-navigation access decision.
//!
//! Order of checks: public allowlist, pending, unauthenticated, capability
//! rules, allow. Public paths never look at the session at all.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use crate::config::SessionConfig;
use crate::net::types::UserRecord;
use crate::state::session::SessionState;
use crate::util::navigation::{login_redirect_url, normalize_path};

pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/",
    "/login",
    "/register",
    "/about-us",
    "/contact-us",
    "/forgot-password",
    "/unauthorized",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    /// Verification still running; render a placeholder instead of redirecting.
    Pending,
    RedirectLogin { return_to: String },
    RedirectUnauthorized { reason: String },
}

/// Permission a protected sub-tree requires from the signed-in user.
#[derive(Clone, Copy, Debug)]
pub enum Capability {
    HotelOperator,
    Admin,
    Seller,
    Custom { name: &'static str, check: fn(&UserRecord) -> bool },
}

impl Capability {
    pub fn allows(self, user: &UserRecord) -> bool {
        match self {
            Self::HotelOperator => user.has_hotel_permissions(),
            Self::Admin => user.is_admin(),
            Self::Seller => user.is_seller(),
            Self::Custom { check, .. } => check(user),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::HotelOperator => "hotel operator permissions",
            Self::Admin => "administrator permissions",
            Self::Seller => "seller permissions",
            Self::Custom { name, .. } => name,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AccessRule {
    pub prefix: String,
    pub capability: Capability,
}

impl AccessRule {
    pub fn new(prefix: &str, capability: Capability) -> Self {
        Self { prefix: normalize_path(prefix).to_owned(), capability }
    }

    /// Segment-boundary prefix match: `/hotel` covers `/hotel/rooms`, not `/hotels`.
    pub fn covers(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || self.prefix.ends_with('/'),
            None => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RouteGuard {
    public_paths: Vec<String>,
    rules: Vec<AccessRule>,
    login_path: String,
    unauthorized_path: String,
}

impl RouteGuard {
    /// Default allowlist and rules (`/hotel`, `/admin`, `/seller`), with the
    /// login and unauthorized paths taken from `config`.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            public_paths: DEFAULT_PUBLIC_PATHS.iter().map(|p| (*p).to_owned()).collect(),
            rules: vec![
                AccessRule::new("/hotel", Capability::HotelOperator),
                AccessRule::new("/admin", Capability::Admin),
                AccessRule::new("/seller", Capability::Seller),
            ],
            login_path: config.login_path.clone(),
            unauthorized_path: config.unauthorized_path.clone(),
        }
    }

    /// Replace the public allowlist (exact matches after normalization).
    #[must_use]
    pub fn with_public_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.public_paths = paths.into_iter().map(|p| normalize_path(p.as_ref()).to_owned()).collect();
        self
    }

    #[must_use]
    pub fn with_rule(mut self, rule: AccessRule) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn without_rules(mut self) -> Self {
        self.rules.clear();
        self
    }

    pub fn is_public(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.public_paths.iter().any(|p| p == path)
    }

    pub fn decide(&self, path: &str, state: &SessionState) -> RouteDecision {
        if self.is_public(path) {
            return RouteDecision::Allow;
        }
        if state.loading || !state.auth_checked {
            return RouteDecision::Pending;
        }
        let Some(user) = &state.user else {
            return RouteDecision::RedirectLogin { return_to: path.trim().to_owned() };
        };

        let normalized = normalize_path(path);
        // First matching rule wins.
        match self.rules.iter().find(|rule| rule.covers(normalized)) {
            Some(rule) if !rule.capability.allows(user) => RouteDecision::RedirectUnauthorized {
                reason: format!("{} requires {}", rule.prefix, rule.capability.describe()),
            },
            _ => RouteDecision::Allow,
        }
    }

    /// Where a redirecting decision should navigate to.
    pub fn redirect_target(&self, decision: &RouteDecision) -> Option<String> {
        match decision {
            RouteDecision::Allow | RouteDecision::Pending => None,
            RouteDecision::RedirectLogin { return_to } => Some(login_redirect_url(&self.login_path, return_to)),
            RouteDecision::RedirectUnauthorized { .. } => Some(self.unauthorized_path.clone()),
        }
    }
}
