//! Environment capabilities used by the session core.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each module isolates one browser concern (storage, time, timers,
//! navigation) behind a small trait with a browser implementation and an
//! in-memory one, keeping the state machine testable off the browser.

pub mod clock;
pub mod jwt;
pub mod navigation;
pub mod schedule;
pub mod storage;
