/// Bearer credential issuing and validation for Nova services
///
/// Tokens are compact JWTs signed with HMAC-SHA256. They bind a subject id,
/// the subject's display name and its effective role to a fixed expiry window.
///
/// ## Security Design
///
/// - **Stateless**: possession of a token with a valid signature and an
///   unexpired `exp` is sufficient proof. There is no revocation list, so a
///   token cannot be cancelled before it expires.
/// - **Opaque failures**: every validation failure (bad signature, malformed
///   token, expired) collapses into `JwtError::Unauthenticated`.
/// - **No leeway**: `exp` is checked against the current time exactly.
///
/// ## Usage
///
/// ```rust
/// use crypto_core::jwt;
///
/// let key = b"change-me";
/// let token = jwt::issue_token("b7e3...", "Alice", "user", key).unwrap();
/// let claims = jwt::validate_token(&token, key).unwrap();
/// assert_eq!(claims.role, "user");
/// ```
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Lifetime of every issued token
pub const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 24;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

/// JWT Claims carried by every bearer credential
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (account id)
    pub sub: String,
    /// Display name of the subject at issue time
    pub name: String,
    /// Effective role ("user" or "admin")
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum JwtError {
    /// Signature invalid, token malformed, or token expired
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Signing key misconfigured: {0}")]
    SigningKey(String),
}

// ============================================================================
// Token Generation
// ============================================================================

/// Issue a bearer token valid for `ACCESS_TOKEN_EXPIRY_HOURS`
///
/// ## Errors
///
/// Returns `JwtError::SigningKey` if the signing key is empty or the token
/// cannot be encoded with it.
pub fn issue_token(
    subject_id: &str,
    subject_name: &str,
    role: &str,
    signing_key: &[u8],
) -> Result<String, JwtError> {
    let expires_at = Utc::now() + Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS);
    issue_token_expiring_at(subject_id, subject_name, role, signing_key, expires_at)
}

/// Issue a bearer token with an explicit expiry instant
pub fn issue_token_expiring_at(
    subject_id: &str,
    subject_name: &str,
    role: &str,
    signing_key: &[u8],
    expires_at: DateTime<Utc>,
) -> Result<String, JwtError> {
    if signing_key.is_empty() {
        return Err(JwtError::SigningKey("signing key is empty".to_string()));
    }

    let claims = Claims {
        sub: subject_id.to_string(),
        name: subject_name.to_string(),
        role: role.to_string(),
        iat: Utc::now().timestamp(),
        exp: expires_at.timestamp(),
    };

    encode(
        &Header::new(JWT_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .map_err(|e| JwtError::SigningKey(format!("failed to sign token: {e}")))
}

// ============================================================================
// Token Validation
// ============================================================================

/// Validate a token's signature and expiry and return its claims
///
/// `token` must not carry the "Bearer " prefix.
pub fn validate_token(token: &str, signing_key: &[u8]) -> Result<Claims, JwtError> {
    if signing_key.is_empty() {
        return Err(JwtError::Unauthenticated);
    }

    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<Claims>(token, &DecodingKey::from_secret(signing_key), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "token validation failed");
            JwtError::Unauthenticated
        })
}

// ============================================================================
// Tests
// ============================================================================
