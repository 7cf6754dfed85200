/// Account business rules: login, registration, read, sparse update, delete
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::{AccountStore, StoreError, StoreResult};
use crate::error::{IdentityError, Result};
use crate::models::{LoginResponse, NewUser, RegisterRequest, UpdateUserRequest, User};
use crate::security::{effective_role, hash_password, is_valid_role, issue_token, verify_password};

/// Deadline applied to every store call unless configured otherwise
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Hash verified against when the username has no account, so that path
/// costs one Argon2 verification like a wrong password does.
static DECOY_PASSWORD_HASH: OnceLock<String> = OnceLock::new();

/// Identity service orchestrating hasher, token issuer and account store.
///
/// Holds no mutable state of its own; clones share the same store.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn AccountStore>,
    signing_key: Arc<Vec<u8>>,
    store_timeout: Duration,
}

impl IdentityService {
    pub fn new(store: Arc<dyn AccountStore>, signing_key: impl Into<Vec<u8>>) -> Self {
        Self {
            store,
            signing_key: Arc::new(signing_key.into()),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    pub fn signing_key(&self) -> &[u8] {
        &self.signing_key
    }

    /// Authenticate and issue a bearer token.
    ///
    /// Unknown usernames, wrong passwords, lookup failures and malformed
    /// stored hashes all surface as [`IdentityError::InvalidCredentials`].
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        info!(username = %username, "login attempt");

        let user = match self
            .with_deadline("find_by_username", self.store.find_by_username(username))
            .await
        {
            Ok(Some(user)) => user,
            Ok(None) => {
                verify_decoy(password.to_string()).await;
                warn!(username = %username, reason = "unknown_user", "login failed");
                return Err(IdentityError::InvalidCredentials);
            }
            Err(e) => {
                verify_decoy(password.to_string()).await;
                error!(username = %username, reason = "lookup_failed", error = %e, "login failed");
                return Err(IdentityError::InvalidCredentials);
            }
        };

        match verify_blocking(password.to_string(), user.password_hash.clone()).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(username = %username, reason = "bad_password", "login failed");
                return Err(IdentityError::InvalidCredentials);
            }
            Err(e) => {
                error!(username = %username, reason = "unverifiable_hash", error = %e, "login failed");
                return Err(IdentityError::InvalidCredentials);
            }
        }

        let role = effective_role(&user.role).to_string();
        let token = issue_token(
            &user.id.to_string(),
            &user.name,
            &role,
            &self.signing_key,
        )?;

        info!(username = %username, user_id = %user.id, role = %role, "login succeeded");
        Ok(LoginResponse { token, role })
    }

    /// Register a new account.
    ///
    /// The role is stored as given; it is not checked against the role
    /// policy here (only updates validate it).
    pub async fn create_user(&self, req: RegisterRequest) -> Result<User> {
        req.validate()?;

        if self
            .with_deadline("find_by_username", self.store.find_by_username(&req.username))
            .await?
            .is_some()
        {
            warn!(username = %req.username, "registration rejected: username taken");
            return Err(IdentityError::AlreadyExists);
        }

        if req.password.is_empty() {
            return Err(IdentityError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }

        let password_hash = hash_blocking(req.password).await?;

        let new_user = NewUser {
            username: req.username,
            name: req.name,
            password_hash,
            role: req.role,
            favorites: req.favorites,
        };

        // A concurrent registration can still win between lookup and insert;
        // the store reports it as Duplicate which maps to AlreadyExists.
        let user = self
            .with_deadline("create", self.store.create(new_user))
            .await?;

        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    /// All accounts in storage order
    pub async fn get_users(&self) -> Result<Vec<User>> {
        Ok(self.with_deadline("list", self.store.list()).await?)
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<User> {
        let id = parse_user_id(id)?;
        self.with_deadline("find_by_id", self.store.find_by_id(id))
            .await?
            .ok_or(IdentityError::NotFound)
    }

    /// Apply a sparse patch.
    ///
    /// Empty or absent `name`/`password`/`role` leave the stored value alone;
    /// present `favorites` (even empty) replace the stored list wholesale.
    pub async fn update_user(&self, id: &str, patch: UpdateUserRequest) -> Result<()> {
        let id = parse_user_id(id)?;
        info!(user_id = %id, "updating user");

        let mut user = self
            .with_deadline("find_by_id", self.store.find_by_id(id))
            .await?
            .ok_or(IdentityError::NotFound)?;

        let role = non_empty(patch.role);
        if let Some(role) = &role {
            if !is_valid_role(role) {
                warn!(user_id = %id, role = %role, "invalid role");
                return Err(IdentityError::InvalidInput("invalid role".to_string()));
            }
        }

        if let Some(name) = non_empty(patch.name) {
            user.name = name;
        }

        if let Some(password) = non_empty(patch.password) {
            user.password_hash = hash_blocking(password).await?;
        }

        if let Some(favorites) = patch.favorites {
            user.favorites = favorites;
        }

        if let Some(role) = role {
            user.role = role;
        }

        self.with_deadline("update", self.store.update(&user))
            .await?;

        info!(user_id = %id, "user updated");
        Ok(())
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        let id = parse_user_id(id)?;

        self.with_deadline("delete", self.store.delete(id)).await?;

        info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// Run a store call under the configured deadline; an elapsed deadline is
    /// reported as a backend failure.
    async fn with_deadline<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    operation,
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "store call timed out"
                );
                Err(StoreError::Backend(format!("{operation} timed out")))
            }
        }
    }
}

fn parse_user_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| IdentityError::InvalidInput("invalid user id".to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| IdentityError::Internal(format!("hashing task failed: {}", e)))?
}

/// Burn one verification against the decoy hash; the outcome is ignored
async fn verify_decoy(password: String) {
    let verified = tokio::task::spawn_blocking(move || {
        let decoy = DECOY_PASSWORD_HASH
            .get_or_init(|| hash_password("decoy-password").unwrap_or_default());
        verify_password(&password, decoy)
    })
    .await;

    if let Ok(Err(e)) = verified {
        warn!(error = %e, "decoy verification failed");
    }
}

async fn verify_blocking(password: String, password_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| IdentityError::Internal(format!("verification task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryAccountStore, MockAccountStore};
    use chrono::Utc;

    const KEY: &[u8] = b"unit-test-signing-key";

    fn register(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            name: format!("{username} display"),
            password: password.to_string(),
            ..Default::default()
        }
    }

    fn stored_user(username: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            name: username.to_string(),
            password_hash: hash_password("s3cret").unwrap(),
            role: String::new(),
            favorites: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_login_lookup_failure_is_invalid_credentials() {
        let mut store = MockAccountStore::new();
        store
            .expect_find_by_username()
            .returning(|_| Err(StoreError::Backend("connection reset".into())));

        let service = IdentityService::new(Arc::new(store), KEY);
        let err = service.login("alice", "s3cret").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials));
    }

    async fn average_failed_login(service: &IdentityService, username: &str) -> Duration {
        const ROUNDS: u32 = 3;
        let start = std::time::Instant::now();
        for _ in 0..ROUNDS {
            let err = service.login(username, "wrong").await.unwrap_err();
            assert!(matches!(err, IdentityError::InvalidCredentials));
        }
        start.elapsed() / ROUNDS
    }

    #[tokio::test]
    async fn test_unknown_user_login_costs_a_verification() {
        // GIVEN: one real account and two stores that cannot find anyone
        let known = IdentityService::new(Arc::new(InMemoryAccountStore::new()), KEY);
        known
            .create_user(register("alice", "s3cret"))
            .await
            .unwrap();

        let mut empty = MockAccountStore::new();
        empty.expect_find_by_username().returning(|_| Ok(None));
        let unknown = IdentityService::new(Arc::new(empty), KEY);

        let mut failing = MockAccountStore::new();
        failing
            .expect_find_by_username()
            .returning(|_| Err(StoreError::Backend("connection reset".into())));
        let failing = IdentityService::new(Arc::new(failing), KEY);

        // Decoy hash is built on first use
        average_failed_login(&unknown, "warmup").await;

        // WHEN: timing failed logins on each path
        let wrong_password = average_failed_login(&known, "alice").await;
        let unknown_user = average_failed_login(&unknown, "bob").await;
        let lookup_failed = average_failed_login(&failing, "bob").await;

        // THEN: all paths are within one order of magnitude
        assert!(
            unknown_user * 10 >= wrong_password,
            "unknown user {:?} vs wrong password {:?}",
            unknown_user,
            wrong_password
        );
        assert!(
            lookup_failed * 10 >= wrong_password,
            "lookup failure {:?} vs wrong password {:?}",
            lookup_failed,
            wrong_password
        );
    }

    #[tokio::test]
    async fn test_login_malformed_stored_hash_is_invalid_credentials() {
        let mut user = stored_user("alice");
        user.password_hash = "plaintext-oops".to_string();

        let mut store = MockAccountStore::new();
        store
            .expect_find_by_username()
            .returning(move |_| Ok(Some(user.clone())));

        let service = IdentityService::new(Arc::new(store), KEY);
        let err = service.login("alice", "s3cret").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_with_empty_key_is_internal() {
        let user = stored_user("alice");
        let mut store = MockAccountStore::new();
        store
            .expect_find_by_username()
            .returning(move |_| Ok(Some(user.clone())));

        let service = IdentityService::new(Arc::new(store), Vec::<u8>::new());
        let err = service.login("alice", "s3cret").await.unwrap_err();
        assert!(matches!(err, IdentityError::Internal(_)));
    }

    #[tokio::test]
    async fn test_register_lost_race_is_already_exists() {
        let mut store = MockAccountStore::new();
        store.expect_find_by_username().returning(|_| Ok(None));
        store
            .expect_create()
            .times(1)
            .returning(|_| Err(StoreError::Duplicate));

        let service = IdentityService::new(Arc::new(store), KEY);
        let err = service
            .create_user(register("alice", "s3cret"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::AlreadyExists));
    }

    #[tokio::test]
    async fn test_register_backend_failure_is_storage() {
        let mut store = MockAccountStore::new();
        store
            .expect_find_by_username()
            .returning(|_| Err(StoreError::Backend("disk full".into())));
        store.expect_create().never();

        let service = IdentityService::new(Arc::new(store), KEY);
        let err = service
            .create_user(register("alice", "s3cret"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Storage(_)));
    }

    #[tokio::test]
    async fn test_register_empty_password_never_writes() {
        let mut store = MockAccountStore::new();
        store.expect_find_by_username().returning(|_| Ok(None));
        store.expect_create().never();

        let service = IdentityService::new(Arc::new(store), KEY);
        let err = service
            .create_user(register("alice", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_invalid_role_update_never_writes() {
        let user = stored_user("alice");
        let id = user.id;

        let mut store = MockAccountStore::new();
        store
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        store.expect_update().never();

        let service = IdentityService::new(Arc::new(store), KEY);
        let patch = UpdateUserRequest {
            role: Some("root".to_string()),
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let err = service
            .update_user(&id.to_string(), patch)
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_store_not_found_is_not_found() {
        let user = stored_user("alice");
        let id = user.id;

        let mut store = MockAccountStore::new();
        store
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        store
            .expect_update()
            .returning(|_| Err(StoreError::NotFound));

        let service = IdentityService::new(Arc::new(store), KEY);
        let err = service
            .update_user(&id.to_string(), UpdateUserRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::NotFound));
    }

    #[tokio::test]
    async fn test_malformed_id_rejected_before_store() {
        let mut store = MockAccountStore::new();
        store.expect_find_by_id().never();
        store.expect_delete().never();

        let service = IdentityService::new(Arc::new(store), KEY);
        assert!(matches!(
            service.get_user_by_id("not-a-uuid").await,
            Err(IdentityError::InvalidInput(_))
        ));
        assert!(matches!(
            service.delete_user("").await,
            Err(IdentityError::InvalidInput(_))
        ));
        assert!(matches!(
            service
                .update_user("42", UpdateUserRequest::default())
                .await,
            Err(IdentityError::InvalidInput(_))
        ));
    }

    struct StalledStore;

    #[async_trait::async_trait]
    impl AccountStore for StalledStore {
        async fn create(&self, _user: NewUser) -> StoreResult<User> {
            std::future::pending().await
        }
        async fn find_by_id(&self, _id: Uuid) -> StoreResult<Option<User>> {
            std::future::pending().await
        }
        async fn find_by_username(&self, _username: &str) -> StoreResult<Option<User>> {
            std::future::pending().await
        }
        async fn update(&self, _user: &User) -> StoreResult<()> {
            std::future::pending().await
        }
        async fn delete(&self, _id: Uuid) -> StoreResult<()> {
            std::future::pending().await
        }
        async fn list(&self) -> StoreResult<Vec<User>> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_store_deadline_is_storage_error() {
        let service = IdentityService::new(Arc::new(StalledStore), KEY)
            .with_store_timeout(Duration::from_millis(20));

        assert!(matches!(
            service.get_users().await,
            Err(IdentityError::Storage(_))
        ));
        assert!(matches!(
            service.delete_user(&Uuid::new_v4().to_string()).await,
            Err(IdentityError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_service_clones_share_store() {
        let service = IdentityService::new(Arc::new(InMemoryAccountStore::new()), KEY);
        let other = service.clone();

        service
            .create_user(register("alice", "s3cret"))
            .await
            .unwrap();
        assert_eq!(other.get_users().await.unwrap().len(), 1);
    }
}
