//! Wire-format tests for the session endpoint payloads.

use super::*;

#[test]
fn test_session_grant_wire_format() {
    // Field names on the wire are camelCase
    let json = r#"{
        "token": "acc-1",
        "refreshToken": "ref-1",
        "permissions": ["metrics.list", "metrics.*"],
        "roles": ["administrator"]
    }"#;

    let grant: SessionGrant = serde_json::from_str(json).unwrap();
    assert_eq!(grant.token, "acc-1");
    assert_eq!(grant.refresh_token, "ref-1");
    assert!(grant.permissions.contains("metrics.*"));
    assert!(grant.roles.contains("administrator"));
}

#[test]
fn test_refresh_request_wire_format() {
    let request = RefreshRequest {
        refresh_token: "ref-1".to_string(),
    };

    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json, serde_json::json!({ "refreshToken": "ref-1" }));
}

#[test]
fn test_refresh_grant_wire_format() {
    let json = r#"{ "token": "acc-2", "refreshToken": "ref-2" }"#;
    let grant: RefreshGrant = serde_json::from_str(json).unwrap();
    assert_eq!(grant.token, "acc-2");
    assert_eq!(grant.refresh_token, "ref-2");
}

#[test]
fn test_profile_response_into_identity() {
    let json = r#"{
        "email": "a@b.com",
        "permissions": ["metrics.list"],
        "roles": []
    }"#;

    let profile: ProfileResponse = serde_json::from_str(json).unwrap();
    let identity: Identity = profile.into();
    assert_eq!(identity.email, "a@b.com");
    assert!(identity.permissions.contains("metrics.list"));
    assert!(identity.roles.is_empty());
}

#[test]
fn test_error_body_tolerates_missing_fields() {
    let body: ErrorBody = serde_json::from_str("{}").unwrap();
    assert_eq!(body.code, None);
    assert_eq!(body.message, None);

    let body: ErrorBody =
        serde_json::from_str(r#"{ "code": "token.expired", "message": "expired" }"#).unwrap();
    assert_eq!(body.code.as_deref(), Some(error_body::TOKEN_EXPIRED_CODE));
}
