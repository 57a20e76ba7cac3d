//! Error types shared by the session core.
//!
//! ERROR HANDLING
//! ==============
//! Only leaf operations produce these errors. `SessionProbe` and `Session`
//! fold them into a `Verdict` or a swallowed-and-logged storage write, so
//! nothing here crosses the public session boundary as a panic.

/// Failure reaching a verification endpoint. Always inconclusive, never a
/// reason to drop the stored credential.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The request was aborted after the configured timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u32 },

    /// The request could not be constructed.
    #[error("request build failed: {0}")]
    Build(String),

    /// No transport exists in this build (non-browser target).
    #[error("transport unavailable outside the browser")]
    Unavailable,
}

/// Failure writing to the persistent key-value backend.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The backend rejected the write (quota, security policy).
    #[error("storage write rejected for key {key}: {message}")]
    WriteRejected { key: String, message: String },

    /// No storage backend is reachable.
    #[error("storage backend unavailable")]
    Unavailable,
}

/// Reasons `Session::login` refuses a payload. State is untouched on error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    /// The payload has no token, or only a bare bearer prefix.
    #[error("login payload is missing a token")]
    MissingToken,

    /// The payload could not be parsed.
    #[error("login payload is malformed: {0}")]
    Malformed(String),
}

/// Failure decoding the expiry claim out of a JWT.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenDecodeError {
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),

    #[error("payload segment is not valid base64url")]
    Base64,

    #[error("payload segment is not a JSON object: {0}")]
    Json(String),

    #[error("payload has no numeric exp claim")]
    MissingExpiry,
}

/// Failure parsing a configuration value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown soft reject policy '{0}' (expected 'continue' or 'terminal')")]
    UnknownSoftReject(String),

    #[error("invalid number for {key}: '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}
