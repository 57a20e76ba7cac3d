//! Networking modules for the session core.
//!
//! SYSTEM CONTEXT
//! ==============
//! `transport` reaches the remote authority and `types` defines the login and
//! verification wire schema shared with it.

pub mod transport;
pub mod types;
