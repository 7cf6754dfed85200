//! Shared cryptographic primitives for Nova services.
//!
//! - `jwt`: signed, time-bounded bearer credentials (HS256)

pub mod jwt;

pub use jwt::{issue_token, validate_token, Claims, JwtError};
