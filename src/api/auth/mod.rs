//! Authentication API endpoints
//!
//! Login, logout and refresh-token rotation.

use axum::{extract::State, routing::post, Router};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, MessageResponse, UserResponse, UserWithTokensResponse};

/// Create the authentication router
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

/// Logout request
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    /// The refresh token of the session to end
    #[serde(default)]
    pub token: String,
}

/// Refresh request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Email or username of the token's owner
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub refresh_token: String,
}

/// Login with email and password
///
/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let session = state
        .auth_service
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        user: UserResponse::from(&session.user),
        access_token: session.tokens.access_token,
        refresh_token: session.tokens.refresh_token,
    }))
}

/// End the session that owns a refresh token
///
/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<LogoutRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth_service.logout(&request.token).await?;

    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// Exchange a refresh token for a new pair
///
/// POST /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<UserWithTokensResponse>, ApiError> {
    let session = state
        .auth_service
        .refresh(&request.identifier, &request.refresh_token)
        .await?;

    Ok(Json(UserWithTokensResponse::new(&session.user, session.tokens)))
}
