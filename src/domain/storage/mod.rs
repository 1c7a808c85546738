//! Storage domain - key-value abstraction the credential store is built on

mod repository;

pub use repository::KeyValueStore;

#[cfg(test)]
pub use repository::MockKeyValueStore;
