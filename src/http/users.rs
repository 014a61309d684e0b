//! User directory routes.

use super::error::{ApiError, ApiResult};
use crate::user::{
    domain::{User, UserId, UserRole},
    ports::UserRepository,
    services::{CreateUserRequest, UserDirectoryService},
};
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Builds the user routes over `service`.
#[must_use]
pub fn routes<U, C>(service: UserDirectoryService<U, C>) -> Router
where
    U: UserRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    Router::new()
        .route("/users", post(create_user::<U, C>))
        .route("/users/{id}", get(get_user::<U, C>))
        .route("/users/by-username/{username}", get(find_by_username::<U, C>))
        .with_state(service)
}

/// JSON representation of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    /// User identifier.
    pub id: UserId,
    /// Unique username.
    pub username: String,
    /// Email address.
    pub email: Option<String>,
    /// Role.
    pub role: UserRole,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            username: user.username().to_owned(),
            email: user.email().map(str::to_owned),
            role: user.role(),
            created_at: user.created_at(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateUserBody {
    username: String,
    email: Option<String>,
    role: Option<String>,
}

async fn create_user<U, C>(
    State(service): State<UserDirectoryService<U, C>>,
    payload: Result<Json<CreateUserBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserView>)>
where
    U: UserRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let Json(body) = payload?;
    let role = body
        .role
        .unwrap_or_else(|| UserRole::default().as_str().to_owned());
    let mut request = CreateUserRequest::new(body.username, role);
    if let Some(email) = body.email {
        request = request.with_email(email);
    }
    let user = service.create(request).await?;
    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

async fn get_user<U, C>(
    State(service): State<UserDirectoryService<U, C>>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserView>>
where
    U: UserRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let user_id: UserId = id
        .parse()
        .map_err(|_| ApiError::Validation(format!("invalid user id: {id}")))?;
    let user = service.get(user_id).await?;
    Ok(Json(UserView::from(&user)))
}

async fn find_by_username<U, C>(
    State(service): State<UserDirectoryService<U, C>>,
    Path(username): Path<String>,
) -> ApiResult<Json<UserView>>
where
    U: UserRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let user = service.find_by_username(&username).await?;
    Ok(Json(UserView::from(&user)))
}
