use super::*;

// =============================================================
// Role
// =============================================================

#[test]
fn role_parse_is_case_insensitive_and_defaults_to_user() {
    assert_eq!(Role::parse("Admin"), Role::Admin);
    assert_eq!(Role::parse(" hotel "), Role::Hotel);
    assert_eq!(Role::parse("seller"), Role::Seller);
    assert_eq!(Role::parse("superuser"), Role::User);
}

#[test]
fn role_deserializes_null_as_user() {
    let role: Role = serde_json::from_value(serde_json::Value::Null).unwrap();
    assert_eq!(role, Role::User);
}

// =============================================================
// UserRecord
// =============================================================

#[test]
fn user_record_accepts_alternate_id_spellings() {
    let a: UserRecord = serde_json::from_value(serde_json::json!({"_id": "u1"})).unwrap();
    let b: UserRecord = serde_json::from_value(serde_json::json!({"id": 42, "hotelId": 7})).unwrap();
    assert_eq!(a.id, "u1");
    assert_eq!(b.id, "42");
    assert_eq!(b.hotel_id.as_deref(), Some("7"));
    assert_eq!(b.role, Role::User);
    assert!(!b.is_hotel);
}

#[test]
fn user_record_serializes_canonical_keys() {
    let user = UserRecord {
        id: "u1".to_owned(),
        name: "Ana".to_owned(),
        email: "ana@example.test".to_owned(),
        phone: None,
        role: Role::Hotel,
        is_hotel: true,
        hotel_id: Some("h9".to_owned()),
    };
    let value = serde_json::to_value(&user).unwrap();
    assert_eq!(value["_id"], "u1");
    assert_eq!(value["role"], "hotel");
    assert_eq!(value["isHotel"], true);
    assert_eq!(value["hotelId"], "h9");
    assert!(value.get("phone").is_none());

    let back: UserRecord = serde_json::from_value(value).unwrap();
    assert_eq!(back, user);
}

#[test]
fn user_record_tolerates_null_fields() {
    let user: UserRecord =
        serde_json::from_value(serde_json::json!({"_id": "u1", "name": null, "isHotel": null, "role": null})).unwrap();
    assert_eq!(user.name, "");
    assert!(!user.is_hotel);
    assert_eq!(user.role, Role::User);
}

#[test]
fn hotel_permissions_need_flag_and_role() {
    let mut user = UserRecord { role: Role::Hotel, is_hotel: true, ..UserRecord::default() };
    assert!(user.has_hotel_permissions());
    user.is_hotel = false;
    assert!(!user.has_hotel_permissions());
    user = UserRecord { role: Role::Seller, is_hotel: true, ..UserRecord::default() };
    assert!(!user.has_hotel_permissions());
}

// =============================================================
// Bearer prefix
// =============================================================

#[test]
fn strip_bearer_prefix_handles_case_and_whitespace() {
    assert_eq!(strip_bearer_prefix("Bearer abc"), "abc");
    assert_eq!(strip_bearer_prefix("  bearer   abc "), "abc");
    assert_eq!(strip_bearer_prefix("abc"), "abc");
    assert_eq!(strip_bearer_prefix("Bearer"), "");
    assert_eq!(strip_bearer_prefix("Bearer "), "");
}

#[test]
fn credential_debug_redacts_secrets() {
    let credential = Credential { token: "secret".to_owned(), refresh_token: Some("r".to_owned()) };
    let rendered = format!("{credential:?}");
    assert!(!rendered.contains("secret"));
    assert!(rendered.contains("<redacted>"));
}

// =============================================================
// LoginPayload
// =============================================================

#[test]
fn login_payload_flat_fields_apply_defaults() {
    let payload = LoginPayload::from_json(serde_json::json!({
        "token": "Bearer t1",
        "_id": "u1",
        "email": "ana@example.test"
    }))
    .unwrap();
    let (credential, user) = payload.into_parts().unwrap();
    assert_eq!(credential.token, "t1");
    assert!(credential.refresh_token.is_none());
    assert_eq!(user.id, "u1");
    assert_eq!(user.email, "ana@example.test");
    assert_eq!(user.role, Role::User);
    assert!(!user.is_hotel);
}

#[test]
fn login_payload_nested_user_wins_over_flat() {
    let payload = LoginPayload::from_json(serde_json::json!({
        "token": "t1",
        "refreshToken": "r1",
        "name": "flat",
        "user": {"_id": "u2", "name": "nested", "role": "hotel", "isHotel": true, "hotelId": 5}
    }))
    .unwrap();
    let (credential, user) = payload.into_parts().unwrap();
    assert_eq!(credential.refresh_token.as_deref(), Some("r1"));
    assert_eq!(user.id, "u2");
    assert_eq!(user.name, "nested");
    assert!(user.has_hotel_permissions());
    assert_eq!(user.hotel_id.as_deref(), Some("5"));
}

#[test]
fn login_payload_without_token_is_rejected() {
    let missing = LoginPayload::from_json(serde_json::json!({"_id": "u1"})).unwrap();
    assert_eq!(missing.into_parts().unwrap_err(), LoginError::MissingToken);

    let blank = LoginPayload::from_json(serde_json::json!({"token": "Bearer "})).unwrap();
    assert_eq!(blank.into_parts().unwrap_err(), LoginError::MissingToken);
}

#[test]
fn login_payload_from_non_object_is_malformed() {
    assert!(matches!(LoginPayload::from_json(serde_json::json!("t1")), Err(LoginError::Malformed(_))));
}

// =============================================================
// VerifyResponse
// =============================================================

#[test]
fn verify_response_soft_reject_only_when_explicit() {
    let explicit: VerifyResponse = serde_json::from_value(serde_json::json!({"isAuthenticated": false})).unwrap();
    let silent: VerifyResponse = serde_json::from_value(serde_json::json!({"user": {"_id": "u1"}})).unwrap();
    let alias: VerifyResponse = serde_json::from_value(serde_json::json!({"authenticated": true})).unwrap();
    assert!(explicit.is_soft_reject());
    assert!(!silent.is_soft_reject());
    assert_eq!(silent.user.map(|u| u.id).as_deref(), Some("u1"));
    assert_eq!(alias.is_authenticated, Some(true));
}
