//! Decode-only JWT expiry inspection.
//!
//! Used as the last resort when no verification endpoint answered. Only the
//! middle segment's `exp` claim is read; the signature is never checked, so
//! the result can only ever confirm "not yet expired", never authenticity.

#[cfg(test)]
#[path = "jwt_test.rs"]
mod jwt_test;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};

use crate::error::TokenDecodeError;

/// Extract the `exp` claim (seconds since the Unix epoch).
///
/// # Errors
///
/// Returns a [`TokenDecodeError`] if the token is not three segments, the
/// payload is not base64url JSON, or `exp` is absent or non-numeric.
pub fn decode_expiry(token: &str) -> Result<f64, TokenDecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenDecodeError::SegmentCount(segments.len()));
    }

    let payload = segments[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .map_err(|_| TokenDecodeError::Base64)?;

    let claims: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| TokenDecodeError::Json(e.to_string()))?;
    if !claims.is_object() {
        return Err(TokenDecodeError::Json("payload is not an object".to_owned()));
    }

    claims
        .get("exp")
        .and_then(serde_json::Value::as_f64)
        .filter(|exp| exp.is_finite())
        .ok_or(TokenDecodeError::MissingExpiry)
}

/// Whether the token is still inside its lifetime at `now_ms`.
///
/// A token whose expiry equals `now_ms` exactly counts as expired.
///
/// # Errors
///
/// Propagates [`decode_expiry`] failures.
#[allow(clippy::cast_precision_loss)]
pub fn is_unexpired(token: &str, now_ms: i64) -> Result<bool, TokenDecodeError> {
    let exp = decode_expiry(token)?;
    Ok(exp * 1000.0 > now_ms as f64)
}
