use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;

pub type Result<T> = std::result::Result<T, IdentityError>;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// Login failed; never says whether the username exists
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("User already exists")]
    AlreadyExists,

    #[error("User not found")]
    NotFound,

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IdentityError {
    /// Message safe to show to clients
    pub fn client_message(&self) -> String {
        match self {
            IdentityError::InvalidCredentials => "invalid credentials".to_string(),
            IdentityError::InvalidInput(msg) => msg.clone(),
            IdentityError::AlreadyExists => "user already exists".to_string(),
            IdentityError::NotFound => "user not found".to_string(),
            IdentityError::Unauthenticated => "Unauthenticated".to_string(),
            // Don't leak internal details
            IdentityError::Storage(_) | IdentityError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl ResponseError for IdentityError {
    fn status_code(&self) -> StatusCode {
        match self {
            IdentityError::InvalidCredentials | IdentityError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            IdentityError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            IdentityError::AlreadyExists => StatusCode::CONFLICT,
            IdentityError::NotFound => StatusCode::NOT_FOUND,
            IdentityError::Storage(_) | IdentityError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(json!({
            "error": self.client_message(),
            "status": status.as_u16()
        }))
    }
}

// Conversions from external error types
impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => IdentityError::AlreadyExists,
            StoreError::NotFound => IdentityError::NotFound,
            StoreError::Backend(msg) => IdentityError::Storage(msg),
        }
    }
}

impl From<crypto_core::JwtError> for IdentityError {
    fn from(err: crypto_core::JwtError) -> Self {
        match err {
            crypto_core::JwtError::Unauthenticated => IdentityError::Unauthenticated,
            crypto_core::JwtError::SigningKey(msg) => IdentityError::Internal(msg),
        }
    }
}

impl From<validator::ValidationErrors> for IdentityError {
    fn from(err: validator::ValidationErrors) -> Self {
        IdentityError::InvalidInput(err.to_string())
    }
}
