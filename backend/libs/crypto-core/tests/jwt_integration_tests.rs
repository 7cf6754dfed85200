/// Integration tests for crypto-core JWT functionality
///
/// This test module covers:
/// - Token issuing and validation with a shared signing key
/// - Expiry handling
/// - Opaque failure kind for every invalid token
use chrono::{Duration, Utc};
use crypto_core::jwt::{issue_token, issue_token_expiring_at, validate_token, JwtError};
use uuid::Uuid;

const SIGNING_KEY: &[u8] = b"integration-test-signing-key-0123456789";

// ============================================================================
// Issuing
// ============================================================================

#[test]
fn test_future_expiry_token_validates_with_same_key() {
    let user_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::minutes(5);

    let token = issue_token_expiring_at(&user_id, "Bob", "user", SIGNING_KEY, expires_at)
        .expect("Should issue token");
    let claims = validate_token(&token, SIGNING_KEY).expect("Should validate token");

    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.exp, expires_at.timestamp());
}

#[test]
fn test_each_issue_binds_given_role() {
    let user_id = Uuid::new_v4().to_string();

    for role in ["user", "admin"] {
        let token = issue_token(&user_id, "Bob", role, SIGNING_KEY).unwrap();
        assert_eq!(validate_token(&token, SIGNING_KEY).unwrap().role, role);
    }
}

// ============================================================================
// Validation failures
// ============================================================================

#[test]
fn test_different_key_fails_unauthenticated() {
    let token = issue_token("id", "Bob", "user", SIGNING_KEY).unwrap();

    let err = validate_token(&token, b"some-other-signing-key").unwrap_err();
    assert!(matches!(err, JwtError::Unauthenticated));
}

#[test]
fn test_elapsed_expiry_fails_unauthenticated() {
    let expires_at = Utc::now() - Duration::hours(1);
    let token = issue_token_expiring_at("id", "Bob", "user", SIGNING_KEY, expires_at).unwrap();

    let err = validate_token(&token, SIGNING_KEY).unwrap_err();
    assert!(matches!(err, JwtError::Unauthenticated));
}

#[test]
fn test_failures_are_indistinguishable() {
    let wrong_key = issue_token("id", "Bob", "user", b"wrong").unwrap();
    let expired = issue_token_expiring_at(
        "id",
        "Bob",
        "user",
        SIGNING_KEY,
        Utc::now() - Duration::minutes(10),
    )
    .unwrap();

    let messages: Vec<String> = [wrong_key.as_str(), expired.as_str(), "garbage", ""]
        .iter()
        .map(|token| validate_token(token, SIGNING_KEY).unwrap_err().to_string())
        .collect();

    assert!(messages.iter().all(|m| m == "Unauthenticated"));
}
