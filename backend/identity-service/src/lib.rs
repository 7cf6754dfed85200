/// Identity Service Library
///
/// Account registration, login, bearer token issuance and account management.
///
/// ## Modules
///
/// - `config`: Service configuration
/// - `db`: Account store contract plus PostgreSQL and in-memory implementations
/// - `error`: Error types
/// - `handlers`: HTTP handlers
/// - `models`: Data models
/// - `routes`: Route table and JSON body config
/// - `security`: Password hashing, tokens, role policy
/// - `services`: Business logic
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;

// Re-export commonly used types
pub use error::{IdentityError, Result};
pub use services::IdentityService;
