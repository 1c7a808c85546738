//! Key-value store trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Ordered string key-value store
///
/// Every method is a single atomic operation against the engine. Callers that
/// need several steps (read a user, then write a token) get no isolation
/// between them.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Retrieves the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Stores `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Stores `value` only if `key` is vacant. Returns false if it was taken.
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, DomainError>;

    /// Removes `key`. Returns false if nothing was stored under it.
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Returns every entry whose key starts with `prefix`, in key order
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, DomainError>;

    /// Round-trips the engine; used by the readiness probe
    async fn ping(&self) -> Result<(), DomainError> {
        self.get("__ping__").await.map(|_| ())
    }
}
