//! Service layer for registering and looking up users.

use crate::user::{
    domain::{User, UserDomainError, UserId, UserRole},
    ports::{UserRepository, UserRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for registering a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserRequest {
    username: String,
    email: Option<String>,
    role: String,
}

impl CreateUserRequest {
    /// Creates a request; `role` is parsed when the user is registered.
    #[must_use]
    pub fn new(username: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            role: role.into(),
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Service-level errors for the user directory.
#[derive(Debug, Error)]
pub enum UserDirectoryError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] UserDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] UserRepositoryError),
    /// No user has the identifier.
    #[error("user not found: {0}")]
    NotFound(UserId),
    /// No user has the username.
    #[error("user not found: {0}")]
    UsernameNotFound(String),
}

/// Result type for user directory operations.
pub type UserDirectoryResult<T> = Result<T, UserDirectoryError>;

/// User directory service.
pub struct UserDirectoryService<R, C>
where
    R: UserRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> Clone for UserDirectoryService<R, C>
where
    R: UserRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> UserDirectoryService<R, C>
where
    R: UserRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new user directory service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Registers a user.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError::Domain`] for a blank username or unknown
    /// role, or [`UserRepositoryError::DuplicateUsername`] (wrapped in
    /// [`UserDirectoryError::Repository`]) when the username is taken.
    pub async fn create(&self, request: CreateUserRequest) -> UserDirectoryResult<User> {
        let role = UserRole::try_from(request.role.as_str())?;
        let user = User::register(request.username, request.email, role, &*self.clock)?;
        self.repository.store(&user).await?;
        info!(user_id = %user.id(), username = user.username(), role = %role, "user registered");
        Ok(user)
    }

    /// Retrieves a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError::NotFound`] when no user matches.
    pub async fn get(&self, id: UserId) -> UserDirectoryResult<User> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserDirectoryError::NotFound(id))
    }

    /// Retrieves a user by exact username.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError::UsernameNotFound`] when no user matches.
    pub async fn find_by_username(&self, username: &str) -> UserDirectoryResult<User> {
        self.repository
            .find_by_username(username.trim())
            .await?
            .ok_or_else(|| UserDirectoryError::UsernameNotFound(username.to_owned()))
    }
}
