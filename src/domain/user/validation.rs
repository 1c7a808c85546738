//! User validation utilities

use thiserror::Error;
use validator::ValidateEmail;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("User ID cannot be empty")]
    EmptyId,

    #[error("User ID exceeds maximum length of {0} characters")]
    IdTooLong(usize),

    #[error("User ID contains invalid character: '{0}'")]
    InvalidIdCharacter(char),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Password is too short. Minimum length is {0} characters")]
    PasswordTooShort(usize),

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),

    #[error("Age must not be negative")]
    NegativeAge,

    #[error("Age exceeds maximum of {0}")]
    AgeTooLarge(u32),
}

const MAX_USER_ID_LENGTH: usize = 64;
pub const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Validate a user ID
///
/// IDs become part of store keys, so the key separator is rejected.
pub fn validate_user_id(id: &str) -> Result<(), UserValidationError> {
    if id.is_empty() {
        return Err(UserValidationError::EmptyId);
    }

    if id.len() > MAX_USER_ID_LENGTH {
        return Err(UserValidationError::IdTooLong(MAX_USER_ID_LENGTH));
    }

    if let Some(c) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(UserValidationError::InvalidIdCharacter(c));
    }

    Ok(())
}

/// Reject a missing or blank value
pub fn validate_required(field: &'static str, value: &str) -> Result<(), UserValidationError> {
    if value.trim().is_empty() {
        return Err(UserValidationError::MissingField(field));
    }

    Ok(())
}

/// Validate a username
///
/// Any non-blank value is accepted; usernames never become store keys.
pub fn validate_username(username: &str) -> Result<(), UserValidationError> {
    validate_required("Username", username)
}

/// Validate presence and format of an email address
pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    validate_required("Email", email)?;

    if !is_valid_email(email) {
        return Err(UserValidationError::InvalidEmail);
    }

    Ok(())
}

/// Format-only email check (HTML5 rules)
pub fn is_valid_email(email: &str) -> bool {
    email.validate_email()
}

/// Validate a password
///
/// Rules:
/// - Minimum 8 characters
/// - Maximum 128 characters
pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    if password.is_empty() {
        return Err(UserValidationError::MissingField("Password"));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }

    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

/// Validate an age supplied by a client and narrow it to the stored type
pub fn validate_age(age: i64) -> Result<u32, UserValidationError> {
    if age < 0 {
        return Err(UserValidationError::NegativeAge);
    }

    u32::try_from(age).map_err(|_| UserValidationError::AgeTooLarge(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_user_ids() {
        assert!(validate_user_id("admin").is_ok());
        assert!(validate_user_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
    }

    #[test]
    fn test_user_id_rejects_separator() {
        assert_eq!(
            validate_user_id("refresh_token:1"),
            Err(UserValidationError::InvalidIdCharacter(':'))
        );
    }

    #[test]
    fn test_user_id_too_long() {
        let long_id = "a".repeat(65);
        assert_eq!(
            validate_user_id(&long_id),
            Err(UserValidationError::IdTooLong(64))
        );
    }

    #[test]
    fn test_required_field_message() {
        let err = validate_required("Name", "   ").unwrap_err();
        assert_eq!(err.to_string(), "Name is required");
    }

    #[test]
    fn test_valid_usernames() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("Al").is_ok());
        assert!(validate_username("john doe").is_ok());
        assert!(validate_username("josé").is_ok());
    }

    #[test]
    fn test_username_required() {
        assert_eq!(
            validate_username(""),
            Err(UserValidationError::MissingField("Username"))
        );
        assert_eq!(
            validate_username("   "),
            Err(UserValidationError::MissingField("Username"))
        );
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("a@x.com").is_ok());
        assert_eq!(
            validate_email(""),
            Err(UserValidationError::MissingField("Email"))
        );
        assert_eq!(
            validate_email("not-an-email"),
            Err(UserValidationError::InvalidEmail)
        );
        assert!(!is_valid_email("two@@x.com"));
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("longenough1").is_ok());
        assert!(validate_password("12345678").is_ok());
        assert_eq!(
            validate_password(""),
            Err(UserValidationError::MissingField("Password"))
        );
        assert_eq!(
            validate_password("1234567"),
            Err(UserValidationError::PasswordTooShort(8))
        );
        assert_eq!(
            validate_password(&"a".repeat(129)),
            Err(UserValidationError::PasswordTooLong(128))
        );
    }

    #[test]
    fn test_age_rules() {
        assert_eq!(validate_age(0), Ok(0));
        assert_eq!(validate_age(42), Ok(42));
        assert_eq!(validate_age(200), Ok(200));
        assert_eq!(validate_age(-1), Err(UserValidationError::NegativeAge));
        assert_eq!(
            validate_age(i64::from(u32::MAX) + 1),
            Err(UserValidationError::AgeTooLarge(u32::MAX))
        );
    }
}
