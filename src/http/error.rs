//! Mapping of service errors onto HTTP responses.

use crate::issue::{ports::IssueRepositoryError, services::IssueLifecycleError};
use crate::user::{ports::UserRepositoryError, services::UserDirectoryError};
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Result type for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error surfaced to HTTP clients as `{"error": message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The addressed resource does not exist (404).
    #[error("{0}")]
    NotFound(String),
    /// The request is malformed or fails validation (400).
    #[error("{0}")]
    Validation(String),
    /// The request conflicts with current state (409).
    #[error("{0}")]
    Conflict(String),
    /// Storage or runtime failure (500). Details are logged, not returned.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    /// Builds a validation error from any displayable message.
    #[must_use]
    pub fn validation(message: impl std::fmt::Display) -> Self {
        Self::Validation(message.to_string())
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn internal(err: &dyn std::error::Error) -> Self {
        error!(error = %err, "request failed with a storage error");
        Self::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<IssueLifecycleError> for ApiError {
    fn from(err: IssueLifecycleError) -> Self {
        match err {
            IssueLifecycleError::Domain(_) => Self::Validation(err.to_string()),
            IssueLifecycleError::NotFound(_) | IssueLifecycleError::ImageNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            IssueLifecycleError::Conflict(_) => Self::Conflict(err.to_string()),
            IssueLifecycleError::Repository(ref repository_err) => match repository_err {
                IssueRepositoryError::NotFound(_) => Self::NotFound(err.to_string()),
                IssueRepositoryError::DuplicateIssue(_)
                | IssueRepositoryError::StaleStatus { .. } => Self::Conflict(err.to_string()),
                IssueRepositoryError::Persistence(_) => Self::internal(&err),
            },
        }
    }
}

impl From<UserDirectoryError> for ApiError {
    fn from(err: UserDirectoryError) -> Self {
        match err {
            UserDirectoryError::Domain(_) => Self::Validation(err.to_string()),
            UserDirectoryError::NotFound(_) | UserDirectoryError::UsernameNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            UserDirectoryError::Repository(ref repository_err) => match repository_err {
                UserRepositoryError::DuplicateUser(_)
                | UserRepositoryError::DuplicateUsername(_) => Self::Conflict(err.to_string()),
                UserRepositoryError::Persistence(_) => Self::internal(&err),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}
