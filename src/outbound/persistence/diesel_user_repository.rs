//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Account creation inserts the user row and its API token inside one
//! transaction so a half-registered account can never be observed.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    NewUserAccount, RegisteredUser, UserCredentials, UserRepository, UserRepositoryError,
};
use crate::domain::{AuthToken, User, UserId, Username};

use super::models::{NewAuthTokenRow, NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{auth_tokens, users};

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            UserRepositoryError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => UserRepositoryError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            UserRepositoryError::connection("database connection error")
        }
        _ => UserRepositoryError::query("database error"),
    }
}

/// Map a registration failure, promoting unique-constraint violations on
/// the username to [`UserRepositoryError::DuplicateUsername`].
fn map_create_error(error: diesel::result::Error, username: &str) -> UserRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    if matches!(
        &error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    ) {
        return UserRepositoryError::duplicate_username(username);
    }
    map_diesel_error(error)
}

/// Convert a database row to a domain user.
fn row_to_user(row: &UserRow) -> Result<User, UserRepositoryError> {
    Ok(User {
        id: UserId::from_uuid(row.id),
        username: Username::new(row.username.clone())
            .map_err(|_| UserRepositoryError::query("stored username is invalid"))?,
        created_at: row.created_at,
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, account: NewUserAccount) -> Result<RegisteredUser, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        let username = account.username.clone();
        let token = account.token.clone();

        conn.transaction(|conn| {
            async move {
                let user_row = NewUserRow {
                    id,
                    username: account.username.as_ref(),
                    password_hash: &account.password_hash,
                    created_at: now,
                };
                diesel::insert_into(users::table)
                    .values(&user_row)
                    .execute(conn)
                    .await?;

                let token_row = NewAuthTokenRow {
                    token: account.token.as_ref(),
                    user_id: id,
                    created_at: now,
                };
                diesel::insert_into(auth_tokens::table)
                    .values(&token_row)
                    .execute(conn)
                    .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_create_error(err, username.as_ref()))?;

        Ok(RegisteredUser {
            user: User {
                id: UserId::from_uuid(id),
                username,
                created_at: now,
            },
            token,
        })
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| {
            Ok(UserCredentials {
                user: row_to_user(&row)?,
                password_hash: row.password_hash,
            })
        })
        .transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_by_token(
        &self,
        token: &AuthToken,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = auth_tokens::table
            .inner_join(users::table)
            .filter(auth_tokens::token.eq(token.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.as_ref().map(row_to_user).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_errors_map_to_connection_errors() {
        let err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(err, UserRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn unique_violations_map_to_duplicate_username() {
        let diesel_err = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value".to_owned()),
        );
        let err = map_create_error(diesel_err, "alice");
        assert!(
            matches!(err, UserRepositoryError::DuplicateUsername { ref username } if username == "alice")
        );
    }

    #[rstest]
    fn valid_rows_convert_to_domain_users() {
        let row = UserRow {
            id: Uuid::new_v4(),
            username: "alice".to_owned(),
            password_hash: "$argon2id$fixture".to_owned(),
            created_at: Utc::now(),
        };
        let user = row_to_user(&row).expect("valid row");
        assert_eq!(user.username.as_ref(), "alice");
    }

    #[rstest]
    fn corrupt_usernames_surface_as_query_errors() {
        let row = UserRow {
            id: Uuid::new_v4(),
            username: "x".to_owned(),
            password_hash: "$argon2id$fixture".to_owned(),
            created_at: Utc::now(),
        };
        let err = row_to_user(&row).expect_err("too short");
        assert!(matches!(err, UserRepositoryError::Query { .. }));
    }
}
