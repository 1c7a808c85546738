//! Domain layer - Core business logic and entities

pub mod error;
pub mod storage;
pub mod user;

pub use error::DomainError;
pub use storage::KeyValueStore;
pub use user::{CredentialStore, Role, User, UserChanges, UserId};
