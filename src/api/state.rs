//! Application state for shared services

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::user::{CredentialStore, User};
use crate::domain::DomainError;
use crate::infrastructure::auth::{AuthService, AuthSession, TokenService};
use crate::infrastructure::user::{
    PasswordHasher, RegisterUserRequest, UpdateUserRequest, UserService,
};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServiceTrait>,
    pub user_service: Arc<dyn UserServiceTrait>,
    pub token_service: Arc<dyn TokenService>,
    pub credential_store: Arc<dyn CredentialStore>,
}

impl AppState {
    /// Wire both services over one store, hasher and token issuer
    pub fn new<S, H>(store: Arc<S>, hasher: Arc<H>, tokens: Arc<dyn TokenService>) -> Self
    where
        S: CredentialStore + 'static,
        H: PasswordHasher + 'static,
    {
        Self {
            auth_service: Arc::new(AuthService::new(
                store.clone(),
                hasher.clone(),
                tokens.clone(),
            )),
            user_service: Arc::new(UserService::new(store.clone(), hasher, tokens.clone())),
            token_service: tokens,
            credential_store: store,
        }
    }
}

/// Trait for session lifecycle operations
#[async_trait]
pub trait AuthServiceTrait: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, DomainError>;
    async fn logout(&self, refresh_token: &str) -> Result<(), DomainError>;
    async fn refresh(&self, identifier: &str, refresh_token: &str)
    -> Result<AuthSession, DomainError>;
}

/// Trait for user account operations
#[async_trait]
pub trait UserServiceTrait: Send + Sync {
    async fn register(&self, request: RegisterUserRequest) -> Result<AuthSession, DomainError>;
    async fn get(&self, id: &str) -> Result<User, DomainError>;
    async fn list(&self) -> Result<Vec<User>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<User, DomainError>;
    async fn update(
        &self,
        id: &str,
        caller_id: &str,
        request: UpdateUserRequest,
    ) -> Result<User, DomainError>;
    async fn delete(&self, id: &str, caller_id: &str) -> Result<(), DomainError>;
}

// Implement traits for the actual services

#[async_trait]
impl<S, H> AuthServiceTrait for AuthService<S, H>
where
    S: CredentialStore + 'static,
    H: PasswordHasher + 'static,
{
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, DomainError> {
        AuthService::login(self, email, password).await
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), DomainError> {
        AuthService::logout(self, refresh_token).await
    }

    async fn refresh(
        &self,
        identifier: &str,
        refresh_token: &str,
    ) -> Result<AuthSession, DomainError> {
        AuthService::refresh(self, identifier, refresh_token).await
    }
}

#[async_trait]
impl<S, H> UserServiceTrait for UserService<S, H>
where
    S: CredentialStore + 'static,
    H: PasswordHasher + 'static,
{
    async fn register(&self, request: RegisterUserRequest) -> Result<AuthSession, DomainError> {
        UserService::register(self, request).await
    }

    async fn get(&self, id: &str) -> Result<User, DomainError> {
        UserService::get(self, id).await
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        UserService::list(self).await
    }

    async fn find_by_email(&self, email: &str) -> Result<User, DomainError> {
        UserService::find_by_email(self, email).await
    }

    async fn update(
        &self,
        id: &str,
        caller_id: &str,
        request: UpdateUserRequest,
    ) -> Result<User, DomainError> {
        UserService::update(self, id, caller_id, request).await
    }

    async fn delete(&self, id: &str, caller_id: &str) -> Result<(), DomainError> {
        UserService::delete(self, id, caller_id).await
    }
}
