use super::*;

#[test]
fn bearer_header_formats_scheme() {
    assert_eq!(bearer_header("abc"), "Bearer abc");
}

#[test]
fn classify_request_error_detects_timeouts() {
    assert_eq!(
        classify_request_error("The operation was aborted.", 500),
        TransportError::Timeout { timeout_ms: 500 }
    );
    assert_eq!(
        classify_request_error("Request TIMEOUT", 10),
        TransportError::Timeout { timeout_ms: 10 }
    );
}

#[test]
fn classify_request_error_defaults_to_network() {
    assert_eq!(
        classify_request_error("Failed to fetch", 500),
        TransportError::Network("Failed to fetch".to_owned())
    );
}

#[test]
fn read_reply_keeps_status_and_body() {
    let reply = read_reply(200, Ok(r#"{"user":{"_id":"u1"}}"#.to_owned()), 500);
    assert_eq!(reply, Ok(ProbeReply::new(200, r#"{"user":{"_id":"u1"}}"#)));
}

#[test]
fn read_reply_turns_failed_body_into_network_error() {
    let reply = read_reply(200, Err("connection reset".to_owned()), 500);
    assert_eq!(reply, Err(TransportError::Network("body read failed: connection reset".to_owned())));
}

#[test]
fn read_reply_aborted_body_is_a_timeout() {
    let reply = read_reply(200, Err("The operation was aborted.".to_owned()), 500);
    assert_eq!(reply, Err(TransportError::Timeout { timeout_ms: 500 }));
}

#[cfg(not(feature = "hydrate"))]
#[test]
fn browser_transport_is_unavailable_natively() {
    let transport = BrowserTransport::new(1000);
    let result = futures::executor::block_on(transport.get("/api/auth/me", "t"));
    assert_eq!(result, Err(TransportError::Unavailable));
}
