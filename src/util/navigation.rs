//! Redirect capability and path helpers.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session core never touches the router directly. It redirects through
//! [`Navigator`], and route components hand it the current path as a string.
//! The helpers here normalize paths for matching and build the login URL
//! that carries the post-login return destination.

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;

use std::cell::RefCell;

pub const RETURN_TO_PARAM: &str = "redirect";

pub trait Navigator {
    fn current_path(&self) -> String;
    fn redirect(&self, path: &str);
}

/// `window.location`. Outside the browser the path is `/` and redirects are
/// dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn current_path(&self) -> String {
        #[cfg(feature = "hydrate")]
        {
            web_sys::window()
                .and_then(|w| w.location().pathname().ok())
                .unwrap_or_else(|| "/".to_owned())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            "/".to_owned()
        }
    }

    fn redirect(&self, path: &str) {
        #[cfg(feature = "hydrate")]
        {
            if let Some(window) = web_sys::window() {
                if window.location().set_href(path).is_err() {
                    log::warn!("redirect to {path} failed");
                }
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            log::debug!("redirect to {path} ignored outside the browser");
        }
    }
}

/// Records redirects instead of performing them.
#[derive(Debug)]
pub struct MemoryNavigator {
    path: RefCell<String>,
    history: RefCell<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(path: &str) -> Self {
        Self { path: RefCell::new(path.to_owned()), history: RefCell::new(Vec::new()) }
    }

    /// Every redirect target, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history.borrow().clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.path.borrow().clone()
    }

    fn redirect(&self, path: &str) {
        *self.path.borrow_mut() = path.to_owned();
        self.history.borrow_mut().push(path.to_owned());
    }
}

/// Strip query string and fragment, and a trailing slash on anything but `/`.
pub fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = path[..end].trim();
    if path.len() > 1 { path.trim_end_matches('/') } else { path }
}

/// Only same-origin absolute paths are allowed as a post-login destination.
pub fn sanitize_return_path<'a>(candidate: Option<&'a str>, fallback: &'a str) -> &'a str {
    match candidate.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => fallback,
    }
}

/// `login_path?redirect=<encoded return_to>`, or the bare login path when
/// there is nothing worth returning to.
pub fn login_redirect_url(login_path: &str, return_to: &str) -> String {
    let return_to = return_to.trim();
    if return_to.is_empty() || return_to == "/" || normalize_path(return_to) == normalize_path(login_path) {
        return login_path.to_owned();
    }
    let encoded: String = url::form_urlencoded::byte_serialize(return_to.as_bytes()).collect();
    format!("{login_path}?{RETURN_TO_PARAM}={encoded}")
}

/// Read the return destination back out of a login page query string.
pub fn return_path_from_query(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(key, _)| key == RETURN_TO_PARAM)
        .map(|(_, value)| value.into_owned())
}
