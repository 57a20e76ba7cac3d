use super::*;

fn token_with_claims(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

#[test]
fn decode_expiry_reads_integer_exp() {
    let token = token_with_claims(&serde_json::json!({"sub": "u1", "exp": 1_700_000_000}));
    assert_eq!(decode_expiry(&token), Ok(1_700_000_000.0));
}

#[test]
fn decode_expiry_accepts_padded_payload() {
    let header = URL_SAFE_NO_PAD.encode(b"{}");
    let payload = base64::engine::general_purpose::URL_SAFE.encode(br#"{"exp":10}"#);
    let token = format!("{header}.{payload}.sig");
    assert_eq!(decode_expiry(&token), Ok(10.0));
}

#[test]
fn decode_expiry_rejects_wrong_segment_count() {
    assert_eq!(decode_expiry("abc"), Err(TokenDecodeError::SegmentCount(1)));
    assert_eq!(decode_expiry("a.b.c.d"), Err(TokenDecodeError::SegmentCount(4)));
}

#[test]
fn decode_expiry_rejects_bad_base64() {
    assert_eq!(decode_expiry("a.!!!.c"), Err(TokenDecodeError::Base64));
}

#[test]
fn decode_expiry_rejects_non_json_payload() {
    let payload = URL_SAFE_NO_PAD.encode(b"not json");
    assert!(matches!(decode_expiry(&format!("a.{payload}.c")), Err(TokenDecodeError::Json(_))));

    let array = URL_SAFE_NO_PAD.encode(b"[1,2]");
    assert!(matches!(decode_expiry(&format!("a.{array}.c")), Err(TokenDecodeError::Json(_))));
}

#[test]
fn decode_expiry_requires_numeric_exp() {
    let missing = token_with_claims(&serde_json::json!({"sub": "u1"}));
    let string = token_with_claims(&serde_json::json!({"exp": "tomorrow"}));
    assert_eq!(decode_expiry(&missing), Err(TokenDecodeError::MissingExpiry));
    assert_eq!(decode_expiry(&string), Err(TokenDecodeError::MissingExpiry));
}

#[test]
fn is_unexpired_treats_exact_now_as_expired() {
    let token = token_with_claims(&serde_json::json!({"exp": 1_000}));
    assert_eq!(is_unexpired(&token, 999_999), Ok(true));
    assert_eq!(is_unexpired(&token, 1_000_000), Ok(false));
    assert_eq!(is_unexpired(&token, 1_000_001), Ok(false));
}
