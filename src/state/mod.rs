//! Session core: persisted credential, remote verification, the state
//! machine, and the per-navigation guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! `guard` reads `session` state on every navigation, `session` drives
//! `probe`, and `probe` reads and writes `token_store`. Nothing here touches
//! the browser directly; capabilities come in through `crate::util` traits.

pub mod guard;
pub mod probe;
pub mod session;
pub mod token_store;

#[cfg(test)]
pub(crate) mod test_helpers;
