//! # Actix Middleware Library
//!
//! Unified middleware components for Nova Actix services
//!
//! ## Modules
//! - `jwt_auth`: bearer-token authentication middleware
//! - `logging`: request/response logging via tracing

pub mod jwt_auth;
pub mod logging;

pub use jwt_auth::{AuthenticatedUser, JwtAuthMiddleware};
pub use logging::RequestLogging;
