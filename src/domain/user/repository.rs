//! Credential store trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{User, UserId};
use crate::domain::DomainError;

/// Persistence for user records and their refresh tokens
///
/// At most one refresh token is kept per user; saving a new one replaces the
/// old. Email addresses are unique across users and `create`/`update` report a
/// taken address as `DomainError::Conflict`.
#[async_trait]
pub trait CredentialStore: Send + Sync + Debug {
    /// Insert a new user
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Get a user by their ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Get a user by their email address (for login)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// List every user
    async fn find_all(&self) -> Result<Vec<User>, DomainError>;

    /// Replace an existing user record
    async fn update(&self, user: &User) -> Result<User, DomainError>;

    /// Delete a user. Returns false if there was nothing to delete.
    async fn delete(&self, id: &UserId) -> Result<bool, DomainError>;

    /// Store `token` as the user's current refresh token
    async fn save_refresh_token(&self, user_id: &UserId, token: &str) -> Result<(), DomainError>;

    /// Resolve a refresh token to the user that owns it
    async fn find_refresh_token(&self, token: &str) -> Result<Option<UserId>, DomainError>;

    /// Drop the user's refresh token. Returns false if none was stored.
    async fn delete_refresh_token(&self, user_id: &UserId) -> Result<bool, DomainError>;

    /// Check if an email address is already registered
    async fn email_exists(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    /// Verify the backing store is reachable
    async fn health_check(&self) -> Result<(), DomainError> {
        self.find_by_email("").await.map(|_| ())
    }
}
