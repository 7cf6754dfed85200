/// Account model and request/response shapes
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A (type, item-id) pair saved by the account holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    #[serde(rename = "type")]
    pub kind: String,
    pub item_id: String,
}

/// User model - core identity entity
///
/// `role` is stored exactly as supplied at registration; an empty string
/// means "unset" and resolves to `user` only when a token is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub favorites: Vec<Favorite>,
    pub created_at: DateTime<Utc>,
}

/// Fields for an account that has not been persisted yet.
/// The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub favorites: Vec<Favorite>,
}

/// User registration request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub favorites: Vec<Favorite>,
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
}

/// Sparse patch for an existing account
///
/// `None` and empty strings leave `name`, `password` and `role` untouched.
/// `favorites: Some(vec![])` clears the stored favorites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub favorites: Option<Vec<Favorite>>,
}

/// Account as returned to trusted callers, password hash included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub favorites: Vec<Favorite>,
    pub role: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            password_hash: user.password_hash,
            created_at: user.created_at,
            favorites: user.favorites,
            role: user.role,
        }
    }
}
