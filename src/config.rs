//! Session configuration baked in at build time.
//!
//! Static WASM deployments have no process environment, so values come from
//! `option_env!` when the bundle is compiled and fall back to defaults. Bad
//! values are logged and replaced by the default rather than failing startup.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_VERIFY_ENDPOINTS: &[&str] = &["/api/auth/verify", "/api/auth/me", "/api/users/me"];
pub const DEFAULT_THROTTLE_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u32 = 10_000;
pub const DEFAULT_LOGOUT_REDIRECT_MS: u64 = 100;
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_UNAUTHORIZED_PATH: &str = "/unauthorized";
pub const DEFAULT_HOME_PATH: &str = "/";

/// How a `200` reply carrying `isAuthenticated: false` is treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SoftRejectPolicy {
    /// Keep probing the remaining endpoints.
    #[default]
    Continue,
    /// Stop and clear credentials, exactly like a `401`.
    Terminal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Prefix joined onto each verification endpoint. Empty means same origin.
    pub api_base_url: String,
    /// Ordered candidate endpoints, tried one at a time.
    pub verify_endpoints: Vec<String>,
    /// Minimum gap between implicit verifications.
    pub throttle: Duration,
    pub request_timeout_ms: u32,
    pub soft_reject: SoftRejectPolicy,
    /// Delay between logout and the redirect to `login_path`.
    pub logout_redirect_delay: Duration,
    pub login_path: String,
    pub unauthorized_path: String,
    pub home_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            verify_endpoints: DEFAULT_VERIFY_ENDPOINTS.iter().map(|e| (*e).to_owned()).collect(),
            throttle: Duration::from_secs(DEFAULT_THROTTLE_SECS),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            soft_reject: SoftRejectPolicy::Continue,
            logout_redirect_delay: Duration::from_millis(DEFAULT_LOGOUT_REDIRECT_MS),
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            unauthorized_path: DEFAULT_UNAUTHORIZED_PATH.to_owned(),
            home_path: DEFAULT_HOME_PATH.to_owned(),
        }
    }
}

impl SessionConfig {
    /// Build config from build-time environment variables.
    ///
    /// Optional:
    /// - `STOREFRONT_API_BASE_URL`: default empty (same origin)
    /// - `STOREFRONT_VERIFY_ENDPOINTS`: comma separated, default `/api/auth/verify,/api/auth/me,/api/users/me`
    /// - `STOREFRONT_AUTH_THROTTLE_SECS`: default 30
    /// - `STOREFRONT_REQUEST_TIMEOUT_MS`: default 10000
    /// - `STOREFRONT_SOFT_REJECT`: `continue` (default) or `terminal`
    /// - `STOREFRONT_LOGOUT_REDIRECT_MS`: default 100
    pub fn load() -> Self {
        Self::from_values(&BuildValues {
            api_base_url: option_env!("STOREFRONT_API_BASE_URL"),
            verify_endpoints: option_env!("STOREFRONT_VERIFY_ENDPOINTS"),
            throttle_secs: option_env!("STOREFRONT_AUTH_THROTTLE_SECS"),
            request_timeout_ms: option_env!("STOREFRONT_REQUEST_TIMEOUT_MS"),
            soft_reject: option_env!("STOREFRONT_SOFT_REJECT"),
            logout_redirect_ms: option_env!("STOREFRONT_LOGOUT_REDIRECT_MS"),
        })
    }

    fn from_values(values: &BuildValues<'_>) -> Self {
        let mut config = Self::default();

        if let Some(base) = values.api_base_url {
            config.api_base_url = base.trim().trim_end_matches('/').to_owned();
        }
        if let Some(raw) = values.verify_endpoints {
            let endpoints = parse_endpoint_list(raw);
            if endpoints.is_empty() {
                log::warn!("STOREFRONT_VERIFY_ENDPOINTS is empty; using defaults");
            } else {
                config.verify_endpoints = endpoints;
            }
        }
        if let Some(raw) = values.throttle_secs {
            config.throttle = Duration::from_secs(or_default(
                parse_number("STOREFRONT_AUTH_THROTTLE_SECS", raw),
                DEFAULT_THROTTLE_SECS,
            ));
        }
        if let Some(raw) = values.request_timeout_ms {
            config.request_timeout_ms =
                or_default(parse_number("STOREFRONT_REQUEST_TIMEOUT_MS", raw), DEFAULT_REQUEST_TIMEOUT_MS);
        }
        if let Some(raw) = values.soft_reject {
            config.soft_reject = or_default(parse_soft_reject(raw), SoftRejectPolicy::Continue);
        }
        if let Some(raw) = values.logout_redirect_ms {
            config.logout_redirect_delay = Duration::from_millis(or_default(
                parse_number("STOREFRONT_LOGOUT_REDIRECT_MS", raw),
                DEFAULT_LOGOUT_REDIRECT_MS,
            ));
        }

        config
    }

    /// Full URL for one verification endpoint.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        let base = self.api_base_url.trim().trim_end_matches('/');
        let path = endpoint.trim();
        if base.is_empty() || path.starts_with("http://") || path.starts_with("https://") {
            path.to_owned()
        } else {
            format!("{base}/{}", path.trim_start_matches('/'))
        }
    }
}

#[derive(Default)]
struct BuildValues<'a> {
    api_base_url: Option<&'a str>,
    verify_endpoints: Option<&'a str>,
    throttle_secs: Option<&'a str>,
    request_timeout_ms: Option<&'a str>,
    soft_reject: Option<&'a str>,
    logout_redirect_ms: Option<&'a str>,
}

fn or_default<T>(parsed: Result<T, ConfigError>, default: T) -> T {
    parsed.unwrap_or_else(|e| {
        log::warn!("{e}; using default");
        default
    })
}

/// Split a comma separated endpoint list, dropping blanks.
pub fn parse_endpoint_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parse a soft reject policy name.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownSoftReject`] for anything other than
/// `continue` or `terminal` (case-insensitive).
pub fn parse_soft_reject(raw: &str) -> Result<SoftRejectPolicy, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "continue" => Ok(SoftRejectPolicy::Continue),
        "terminal" => Ok(SoftRejectPolicy::Terminal),
        _ => Err(ConfigError::UnknownSoftReject(raw.trim().to_owned())),
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidNumber { key, value: raw.to_owned() })
}
