/// Account storage for identity service
///
/// The service only sees the [`AccountStore`] trait; `users` holds the
/// PostgreSQL implementation and `memory` an in-process one used by tests and
/// `STORE_BACKEND=memory`.
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewUser, User};

pub mod memory;
pub mod users;

pub use memory::InMemoryAccountStore;
pub use users::PgAccountStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint on `username` rejected the write
    #[error("duplicate key")]
    Duplicate,

    /// No record matched the key
    #[error("record not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                StoreError::Duplicate
            }
            sqlx::Error::RowNotFound => StoreError::NotFound,
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Durable keyed storage of accounts with a uniqueness constraint on
/// `username`.
///
/// Implementations must make the uniqueness check and the insert in
/// [`create`](AccountStore::create) a single atomic step.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account, assigning `id` and `created_at`.
    /// Fails with [`StoreError::Duplicate`] when the username is taken.
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Overwrite the mutable fields (name, password hash, role, favorites)
    /// of the record with `user.id`. [`StoreError::NotFound`] if no row matched.
    async fn update(&self, user: &User) -> StoreResult<()>;

    /// [`StoreError::NotFound`] if nothing was removed.
    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    /// All accounts in insertion order
    async fn list(&self) -> StoreResult<Vec<User>>;
}
