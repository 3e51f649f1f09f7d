//! Port for user accounts and their API tokens.
//!
//! Account creation is atomic with token issuance: the store either
//! persists both the user row and its single token, or neither.

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::auth::AuthToken;
use crate::domain::user::{User, UserId, Username};

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "user store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "user store query failed: {message}",
        /// The unique constraint on the username was violated.
        DuplicateUsername { username: String } =>
            "username \"{username}\" is already taken",
    }
}

/// Fields required to register a user.
#[derive(Debug, Clone)]
pub struct NewUserAccount {
    pub username: Username,
    /// Argon2id PHC string; never the plaintext password.
    pub password_hash: String,
    /// Token issued alongside the account, per the registration contract.
    pub token: AuthToken,
}

/// Result of a successful registration.
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub user: User,
    pub token: AuthToken,
}

/// User plus stored password hash, for credential verification.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Port for user account storage and lookup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new account and its token in one transaction.
    ///
    /// Fails with [`UserRepositoryError::DuplicateUsername`] when the
    /// username is taken.
    async fn create(&self, account: NewUserAccount) -> Result<RegisteredUser, UserRepositoryError>;

    /// Look up a user and password hash by login name.
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, UserRepositoryError>;

    /// Look up a user by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Resolve an API token to its user.
    async fn find_by_token(&self, token: &AuthToken)
        -> Result<Option<User>, UserRepositoryError>;
}

#[derive(Debug, Clone)]
struct StoredAccount {
    user: User,
    password_hash: String,
    token: AuthToken,
}

/// In-memory implementation backing tests and database-less development runs.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    accounts: std::sync::Mutex<Vec<StoredAccount>>,
}

impl InMemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Vec<StoredAccount>>, UserRepositoryError> {
        self.accounts
            .lock()
            .map_err(|_| UserRepositoryError::query("user store mutex poisoned"))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, account: NewUserAccount) -> Result<RegisteredUser, UserRepositoryError> {
        let mut accounts = self.lock()?;
        if accounts
            .iter()
            .any(|stored| stored.user.username.as_ref() == account.username.as_ref())
        {
            return Err(UserRepositoryError::duplicate_username(
                account.username.as_ref(),
            ));
        }

        let user = User {
            id: UserId::random(),
            username: account.username,
            created_at: Utc::now(),
        };
        accounts.push(StoredAccount {
            user: user.clone(),
            password_hash: account.password_hash,
            token: account.token.clone(),
        });
        Ok(RegisteredUser {
            user,
            token: account.token,
        })
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, UserRepositoryError> {
        let accounts = self.lock()?;
        Ok(accounts
            .iter()
            .find(|stored| stored.user.username.as_ref() == username)
            .map(|stored| UserCredentials {
                user: stored.user.clone(),
                password_hash: stored.password_hash.clone(),
            }))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let accounts = self.lock()?;
        Ok(accounts
            .iter()
            .find(|stored| stored.user.id == *id)
            .map(|stored| stored.user.clone()))
    }

    async fn find_by_token(
        &self,
        token: &AuthToken,
    ) -> Result<Option<User>, UserRepositoryError> {
        let accounts = self.lock()?;
        Ok(accounts
            .iter()
            .find(|stored| stored.token == *token)
            .map(|stored| stored.user.clone()))
    }
}
