//! Leptos glue around the session core.

pub mod route_guard;
pub mod session_provider;
