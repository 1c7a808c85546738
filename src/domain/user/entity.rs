//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{validate_user_id, UserValidationError};

/// User identifier - generated as a UUID v4 on registration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Create a new UserId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        validate_user_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role carried in access tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular self-service account
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record as persisted in the credential store
///
/// The password field only ever holds an Argon2 PHC string. Use the API's
/// sanitized view when returning a user to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: String,
    email: String,
    password_hash: String,
    name: String,
    lastname: String,
    #[serde(default)]
    age: u32,
    #[serde(default)]
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Field changes to merge into a stored user
///
/// `None` leaves a field untouched; empty strings are ignored as well. The
/// password must already be hashed.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub age: Option<u32>,
}

impl User {
    /// Create a new user with the default role
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        name: impl Into<String>,
        lastname: impl Into<String>,
        age: u32,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            name: name.into(),
            lastname: lastname.into(),
            age,
            role: Role::default(),
            created_at: now,
            updated_at: now,
        }
    }

    // Getters

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lastname(&self) -> &str {
        &self.lastname
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// A record missing its name or email cannot have come from registration
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.email.is_empty()
    }

    /// True if `identifier` is this user's email or username
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        self.email == identifier || self.username == identifier
    }

    // Mutators

    /// Merge changes into this user. Returns true if any field changed.
    pub fn apply(&mut self, changes: UserChanges) -> bool {
        let mut changed = false;

        changed |= merge_text(&mut self.username, changes.username);
        changed |= merge_text(&mut self.email, changes.email);
        changed |= merge_text(&mut self.password_hash, changes.password_hash);
        changed |= merge_text(&mut self.name, changes.name);
        changed |= merge_text(&mut self.lastname, changes.lastname);

        if let Some(age) = changes.age {
            if self.age != age {
                self.age = age;
                changed = true;
            }
        }

        if changed {
            self.touch();
        }

        changed
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn merge_text(field: &mut String, incoming: Option<String>) -> bool {
    match incoming {
        Some(value) if !value.is_empty() && *field != value => {
            *field = value;
            true
        }
        _ => false,
    }
}
