//! User infrastructure module
//!
//! Password hashing with Argon2, the key-value backed credential store, and
//! the user service.

mod password;
mod repository;
mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use repository::KvCredentialStore;
pub use service::{RegisterUserRequest, UpdateUserRequest, UserService};
