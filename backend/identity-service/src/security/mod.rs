/// Security module for authentication and authorization
///
/// Provides core security primitives for identity-service:
/// - Password hashing and verification (Argon2id)
/// - Role policy
///
/// Bearer tokens are issued through the shared crypto-core library.
pub mod password;
pub mod roles;

pub use crypto_core::jwt::issue_token;
pub use password::{hash_password, verify_password};
pub use roles::{effective_role, is_valid_role};
