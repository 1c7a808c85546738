//! User domain
//!
//! Types and traits for user accounts: the user entity, input validation
//! rules and the credential store that persists users and refresh tokens.

mod entity;
mod repository;
mod validation;

pub use entity::{Role, User, UserChanges, UserId};
pub use repository::CredentialStore;
pub use validation::{
    is_valid_email, validate_age, validate_email, validate_password, validate_required,
    validate_user_id, validate_username, UserValidationError, MIN_PASSWORD_LENGTH,
};

#[cfg(test)]
pub use repository::mock::MockCredentialStore;
