//! User API endpoints
//!
//! Registration is public, reads are public, and mutations require the
//! caller's own access token.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;

use crate::api::middleware::AuthenticatedUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, MessageResponse, UserResponse, UserWithTokensResponse};
use crate::infrastructure::user::{RegisterUserRequest, UpdateUserRequest};

/// Create the user router
pub fn create_user_router() -> Router<AppState> {
    Router::new()
        .route("/user", get(list_users))
        .route("/user/", get(list_users))
        .route("/user/create", post(create_user))
        .route("/user/search", get(search_user))
        .route("/user/update/{id}", patch(update_user))
        .route("/user/{id}", get(get_user).delete(delete_user))
}

/// Registration request
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub age: i64,
}

impl From<CreateUserRequest> for RegisterUserRequest {
    fn from(request: CreateUserRequest) -> Self {
        Self {
            username: request.username,
            email: request.email,
            password: request.password,
            name: request.name,
            lastname: request.lastname,
            age: request.age,
        }
    }
}

/// Partial update request; omitted fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct PatchUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub age: Option<i64>,
}

impl From<PatchUserRequest> for UpdateUserRequest {
    fn from(request: PatchUserRequest) -> Self {
        Self {
            username: request.username,
            email: request.email,
            password: request.password,
            name: request.name,
            lastname: request.lastname,
            age: request.age,
        }
    }
}

/// Query string for email lookups
#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// Register a new user
///
/// POST /user/create
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserWithTokensResponse>), ApiError> {
    let session = state.user_service.register(request.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserWithTokensResponse::new(&session.user, session.tokens)),
    ))
}

/// Get a user by ID
///
/// GET /user/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.user_service.get(&id).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// Find a user by email
///
/// GET /user/search?email=
pub async fn search_user(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<UserResponse>, ApiError> {
    let email = query.email.unwrap_or_default();
    let user = state.user_service.find_by_email(&email).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// List users, or look one up when `email` is given
///
/// GET /user
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Response, ApiError> {
    if let Some(email) = query.email {
        let user = state.user_service.find_by_email(&email).await?;
        return Ok(Json(UserResponse::from(&user)).into_response());
    }

    let users: Vec<UserResponse> = state
        .user_service
        .list()
        .await?
        .iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users).into_response())
}

/// Update the caller's own account
///
/// PATCH /user/update/{id}
pub async fn update_user(
    caller: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PatchUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = state
        .user_service
        .update(&id, &caller.user_id, request.into())
        .await?;

    Ok(Json(MessageResponse::for_user(
        "User updated successfully",
        user.id().as_str(),
    )))
}

/// Delete the caller's own account
///
/// DELETE /user/{id}
pub async fn delete_user(
    caller: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.user_service.delete(&id, &caller.user_id).await?;

    Ok(Json(MessageResponse::for_user("User deleted successfully", id)))
}
