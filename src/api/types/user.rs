//! User representations returned to clients

use serde::{Deserialize, Serialize};

use crate::domain::user::User;
use crate::infrastructure::auth::TokenPair;

/// Sanitized user view; never includes the password hash or role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: String,
    pub lastname: String,
    pub age: u32,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().as_str().to_string(),
            username: user.username().to_string(),
            email: user.email().to_string(),
            name: user.name().to_string(),
            lastname: user.lastname().to_string(),
            age: user.age(),
        }
    }
}

/// User fields with a token pair alongside them
#[derive(Debug, Serialize)]
pub struct UserWithTokensResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

impl UserWithTokensResponse {
    pub fn new(user: &User, tokens: TokenPair) -> Self {
        Self {
            user: UserResponse::from(user),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}

/// Acknowledgement body for mutations
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            user_id: None,
        }
    }

    pub fn for_user(message: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            user_id: Some(user_id.into()),
        }
    }
}
