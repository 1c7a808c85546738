//! Login, logout and refresh-token rotation

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::jwt::{TokenPair, TokenService};
use crate::domain::user::{validate_email, CredentialStore, User, UserId};
use crate::domain::DomainError;
use crate::infrastructure::observability::{record_auth_event, AuthEvent};
use crate::infrastructure::user::PasswordHasher;

/// Tokens handed out together with the user they were issued for
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub tokens: TokenPair,
    pub user: User,
}

/// Issue a pair for `user` and store its refresh token
pub(crate) async fn start_session<S: CredentialStore + ?Sized>(
    store: &S,
    tokens: &dyn TokenService,
    user: User,
) -> Result<AuthSession, DomainError> {
    let pair = tokens.issue(user.id(), user.username(), user.role())?;
    store.save_refresh_token(user.id(), &pair.refresh_token).await?;

    Ok(AuthSession { tokens: pair, user })
}

/// Authentication service handling the session lifecycle
#[derive(Debug)]
pub struct AuthService<S: CredentialStore, H: PasswordHasher> {
    store: Arc<S>,
    hasher: Arc<H>,
    tokens: Arc<dyn TokenService>,
}

impl<S: CredentialStore, H: PasswordHasher> AuthService<S, H> {
    pub fn new(store: Arc<S>, hasher: Arc<H>, tokens: Arc<dyn TokenService>) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Exchange email and password for a fresh token pair
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, DomainError> {
        let result = self.authenticate(email, password).await;
        record_auth_event(AuthEvent::Login, result.is_ok());
        result
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession, DomainError> {
        validate_email(email).map_err(|e| DomainError::validation(e.to_string()))?;

        if password.is_empty() {
            return Err(DomainError::validation("Password is required"));
        }

        let Some(user) = self.store.find_by_email(email).await? else {
            self.hasher.verify_dummy(password);
            debug!("Login attempt for unknown email");
            return Err(DomainError::InvalidCredentials);
        };

        if !self.hasher.verify(password, user.password_hash()) {
            debug!(user_id = %user.id(), "Login attempt with wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        self.discard_refresh_token(user.id()).await;

        let session = start_session(self.store.as_ref(), self.tokens.as_ref(), user).await?;
        info!(user_id = %session.user.id(), "User logged in");

        Ok(session)
    }

    /// Revoke the session that owns `refresh_token`
    pub async fn logout(&self, refresh_token: &str) -> Result<(), DomainError> {
        let result = self.revoke(refresh_token).await;
        record_auth_event(AuthEvent::Logout, result.is_ok());
        result
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), DomainError> {
        if refresh_token.is_empty() {
            return Err(DomainError::validation("Token is required"));
        }

        let user_id = self
            .store
            .find_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| DomainError::unauthorized("Invalid or expired token"))?;

        // Already gone means someone else logged this session out first
        if !self.store.delete_refresh_token(&user_id).await? {
            debug!(user_id = %user_id, "Refresh token was removed concurrently");
        }

        info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Rotate a refresh token into a new pair
    ///
    /// `identifier` must be the email or username of the token's owner.
    pub async fn refresh(
        &self,
        identifier: &str,
        refresh_token: &str,
    ) -> Result<AuthSession, DomainError> {
        let result = self.rotate(identifier, refresh_token).await;
        record_auth_event(AuthEvent::Refresh, result.is_ok());
        result
    }

    async fn rotate(&self, identifier: &str, refresh_token: &str) -> Result<AuthSession, DomainError> {
        if identifier.is_empty() {
            return Err(DomainError::validation("Identifier is required"));
        }

        if refresh_token.is_empty() {
            return Err(DomainError::validation("Refresh token is required"));
        }

        let claims = self.tokens.verify_refresh(refresh_token)?;

        let user_id = self
            .store
            .find_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| DomainError::unauthorized("Invalid or expired refresh token"))?;

        if claims.user_id != user_id.as_str() {
            warn!(user_id = %user_id, "Refresh token stored under a different user");
            return Err(DomainError::unauthorized("Invalid or expired refresh token"));
        }

        let user = self
            .store
            .find_by_id(&user_id)
            .await?
            .filter(|user| user.matches_identifier(identifier))
            .ok_or_else(|| DomainError::unauthorized("Invalid credentials"))?;

        self.discard_refresh_token(user.id()).await;

        let session = start_session(self.store.as_ref(), self.tokens.as_ref(), user).await?;
        info!(user_id = %session.user.id(), "Refresh token rotated");

        Ok(session)
    }

    async fn discard_refresh_token(&self, user_id: &UserId) {
        match self.store.delete_refresh_token(user_id).await {
            Ok(true) => {}
            Ok(false) => debug!(user_id = %user_id, "No previous refresh token to discard"),
            Err(e) => warn!(user_id = %user_id, error = %e, "Failed to discard previous refresh token"),
        }
    }
}
