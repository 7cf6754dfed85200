use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountStore, StoreError, StoreResult};
use crate::models::{NewUser, User};

/// In-process account store.
///
/// Records are kept in insertion order behind one lock; the duplicate check
/// and the push happen under the same write guard.
#[derive(Default)]
pub struct InMemoryAccountStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate);
        }

        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            name: user.name,
            password_hash: user.password_hash,
            role: user.role,
            favorites: user.favorites,
            created_at: Utc::now(),
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let existing = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(StoreError::NotFound)?;

        // id, username and created_at are immutable
        existing.name = user.name.clone();
        existing.password_hash = user.password_hash.clone();
        existing.role = user.role.clone();
        existing.favorites = user.favorites.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        users.remove(index);
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.read().await.clone())
    }
}
