//! User service for registration and account management

use std::sync::Arc;

use tracing::info;

use crate::domain::user::{
    validate_age, validate_email, validate_password, validate_required, validate_username,
    CredentialStore, User, UserChanges, UserId, UserValidationError,
};
use crate::domain::DomainError;
use crate::infrastructure::auth::{start_session, AuthSession, TokenService};
use crate::infrastructure::observability::{record_auth_event, AuthEvent};

use super::password::PasswordHasher;

const EMAIL_TAKEN: &str = "Email already exists";

/// Request for registering a new user
#[derive(Debug, Clone, Default)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub lastname: String,
    pub age: i64,
}

/// Partial update of a user's own account
///
/// Absent fields and empty strings leave the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub age: Option<i64>,
}

fn invalid(e: UserValidationError) -> DomainError {
    DomainError::validation(e.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// User service for registration and account management
#[derive(Debug)]
pub struct UserService<S: CredentialStore, H: PasswordHasher> {
    store: Arc<S>,
    hasher: Arc<H>,
    tokens: Arc<dyn TokenService>,
}

impl<S: CredentialStore, H: PasswordHasher> UserService<S, H> {
    /// Create a new user service
    pub fn new(store: Arc<S>, hasher: Arc<H>, tokens: Arc<dyn TokenService>) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Register a new account and sign it in
    pub async fn register(&self, request: RegisterUserRequest) -> Result<AuthSession, DomainError> {
        let result = self.create_account(request).await;
        record_auth_event(AuthEvent::Register, result.is_ok());
        result
    }

    async fn create_account(&self, request: RegisterUserRequest) -> Result<AuthSession, DomainError> {
        validate_required("Name", &request.name).map_err(invalid)?;
        validate_required("Lastname", &request.lastname).map_err(invalid)?;
        validate_username(&request.username).map_err(invalid)?;
        validate_email(&request.email).map_err(invalid)?;
        validate_password(&request.password).map_err(invalid)?;
        let age = validate_age(request.age).map_err(invalid)?;

        if self.store.email_exists(&request.email).await? {
            return Err(DomainError::validation(EMAIL_TAKEN));
        }

        let password_hash = self.hasher.hash(&request.password)?;

        let user = User::new(
            UserId::generate(),
            request.username,
            request.email,
            password_hash,
            request.name,
            request.lastname,
            age,
        );

        let user = self.store.create(user).await.map_err(|e| match e {
            DomainError::Conflict { .. } => DomainError::validation(EMAIL_TAKEN),
            other => other,
        })?;

        info!(user_id = %user.id(), "User registered");

        start_session(self.store.as_ref(), self.tokens.as_ref(), user).await
    }

    /// Get a user by ID
    pub async fn get(&self, id: &str) -> Result<User, DomainError> {
        let not_found = || DomainError::not_found(format!("User '{}' not found", id));

        let user_id = UserId::new(id).map_err(|_| not_found())?;
        let user = self.store.find_by_id(&user_id).await?.ok_or_else(not_found)?;

        if !user.is_complete() {
            return Err(DomainError::internal(format!(
                "User record '{}' is missing its name or email",
                id
            )));
        }

        Ok(user)
    }

    /// List all users ordered by username
    pub async fn list(&self) -> Result<Vec<User>, DomainError> {
        let mut users = self.store.find_all().await?;
        users.sort_by(|a, b| a.username().cmp(b.username()));
        Ok(users)
    }

    /// Find a user by their email address
    pub async fn find_by_email(&self, email: &str) -> Result<User, DomainError> {
        validate_email(email).map_err(invalid)?;

        self.store
            .find_by_email(email)
            .await?
            .ok_or_else(|| DomainError::not_found("User not found"))
    }

    /// Apply a partial update to the caller's own account
    pub async fn update(
        &self,
        id: &str,
        caller_id: &str,
        request: UpdateUserRequest,
    ) -> Result<User, DomainError> {
        if id != caller_id {
            return Err(DomainError::forbidden("You can only update your own account"));
        }

        let not_found = || DomainError::not_found(format!("User '{}' not found", id));
        let user_id = UserId::new(id).map_err(|_| not_found())?;
        let mut user = self.store.find_by_id(&user_id).await?.ok_or_else(not_found)?;

        let username = non_empty(request.username);
        let email = non_empty(request.email);
        let password = non_empty(request.password);

        if let Some(username) = &username {
            validate_username(username).map_err(invalid)?;
        }

        if let Some(email) = &email {
            validate_email(email).map_err(invalid)?;

            let taken = self
                .store
                .find_by_email(email)
                .await?
                .is_some_and(|owner| owner.id() != &user_id);

            if taken {
                return Err(DomainError::validation(EMAIL_TAKEN));
            }
        }

        let age = request
            .age
            .map(validate_age)
            .transpose()
            .map_err(invalid)?;

        let password_hash = match password {
            Some(password) => {
                validate_password(&password).map_err(invalid)?;
                Some(self.hasher.hash(&password)?)
            }
            None => None,
        };

        let changed = user.apply(UserChanges {
            username,
            email,
            password_hash,
            name: request.name,
            lastname: request.lastname,
            age,
        });

        if !changed {
            return Ok(user);
        }

        let user = self.store.update(&user).await.map_err(|e| match e {
            DomainError::Conflict { .. } => DomainError::validation(EMAIL_TAKEN),
            other => other,
        })?;

        info!(user_id = %user.id(), "User updated");
        Ok(user)
    }

    /// Delete the caller's own account along with its session
    pub async fn delete(&self, id: &str, caller_id: &str) -> Result<(), DomainError> {
        if id != caller_id {
            return Err(DomainError::forbidden("You can only delete your own account"));
        }

        let not_found = || DomainError::not_found(format!("User '{}' not found", id));
        let user_id = UserId::new(id).map_err(|_| not_found())?;

        if !self.store.delete(&user_id).await? {
            return Err(not_found());
        }

        info!(user_id = %user_id, "User deleted");
        Ok(())
    }
}
