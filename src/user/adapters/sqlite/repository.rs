//! `SQLite` repository implementation for the user directory.

use super::{models::UserRow, schema::users};
use crate::database::{SqlitePool, decode_timestamp, encode_timestamp};
use crate::user::{
    domain::{PersistedUserData, User, UserId, UserRole},
    ports::{UserRepository, UserRepositoryError, UserRepositoryResult},
};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;

/// `SQLite`-backed user repository.
#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    /// Creates a repository over a migrated connection pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> UserRepositoryResult<T>
    where
        F: FnOnce(&mut SqliteConnection) -> UserRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(UserRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(UserRepositoryError::persistence)?
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn store(&self, user: &User) -> UserRepositoryResult<()> {
        let user_id = user.id();
        let username = user.username().to_owned();
        let new_row = to_row(user);

        self.run_blocking(move |connection| {
            // Concurrent inserts still surface through the unique index.
            if find_row_by_username(connection, &username)?.is_some() {
                return Err(UserRepositoryError::DuplicateUsername(username));
            }

            diesel::insert_into(users::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_username_unique_violation(&**info) =>
                    {
                        UserRepositoryError::DuplicateUsername(username.clone())
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        UserRepositoryError::DuplicateUser(user_id)
                    }
                    _ => UserRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: UserId) -> UserRepositoryResult<Option<User>> {
        self.run_blocking(move |connection| {
            let row = users::table
                .find(id.to_string())
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()
                .map_err(UserRepositoryError::persistence)?;
            row.map(row_to_user).transpose()
        })
        .await
    }

    async fn find_by_username(&self, username: &str) -> UserRepositoryResult<Option<User>> {
        let lookup = username.to_owned();
        self.run_blocking(move |connection| {
            find_row_by_username(connection, &lookup)?
                .map(row_to_user)
                .transpose()
        })
        .await
    }
}

fn find_row_by_username(
    connection: &mut SqliteConnection,
    username: &str,
) -> UserRepositoryResult<Option<UserRow>> {
    users::table
        .filter(users::username.eq(username))
        .select(UserRow::as_select())
        .first::<UserRow>(connection)
        .optional()
        .map_err(UserRepositoryError::persistence)
}

fn is_username_unique_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == "idx_users_username_unique")
        || info.message().contains("users.username")
}

fn to_row(user: &User) -> UserRow {
    UserRow {
        id: user.id().to_string(),
        username: user.username().to_owned(),
        email: user.email().map(str::to_owned),
        role: user.role().as_str().to_owned(),
        created_at: encode_timestamp(user.created_at()),
    }
}

fn row_to_user(row: UserRow) -> UserRepositoryResult<User> {
    let UserRow {
        id,
        username,
        email,
        role,
        created_at,
    } = row;

    Ok(User::from_persisted(PersistedUserData {
        id: id
            .parse::<UserId>()
            .map_err(UserRepositoryError::persistence)?,
        username,
        email,
        role: UserRole::try_from(role.as_str()).map_err(UserRepositoryError::persistence)?,
        created_at: decode_timestamp(&created_at).map_err(UserRepositoryError::persistence)?,
    }))
}
