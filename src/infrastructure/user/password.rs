//! Password hashing utilities using Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as Argon2PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::fmt::Debug;
use std::sync::OnceLock;

use crate::domain::DomainError;

/// Trait for password hashing operations
pub trait PasswordHasher: Send + Sync + Debug {
    /// Hash a password into a PHC string
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// Verify a password against a hash
    fn verify(&self, password: &str, hash: &str) -> bool;

    /// Spend the cost of a verification without a stored hash
    ///
    /// Called when a login names an unknown account, so the response time
    /// matches a wrong-password attempt.
    fn verify_dummy(&self, password: &str) {
        let _ = password;
    }
}

/// Argon2id password hasher
#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
    dummy_hash: OnceLock<String>,
}

impl Debug for Argon2Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("params", self.argon2.params())
            .finish()
    }
}

impl Argon2Hasher {
    /// Create a hasher with the crate's recommended Argon2id parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hasher with explicit cost parameters
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy_hash: OnceLock::new(),
        }
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::internal(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn verify_dummy(&self, password: &str) {
        let hash = self
            .dummy_hash
            .get_or_init(|| self.hash("dummy-password").unwrap_or_default());

        let _ = self.verify(password, hash);
    }
}
