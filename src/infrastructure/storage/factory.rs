//! Storage factory for runtime engine selection

use std::sync::Arc;

use crate::domain::storage::KeyValueStore;
use crate::domain::DomainError;

use super::in_memory::InMemoryKeyValueStore;
use super::sqlite::SqliteKeyValueStore;

/// Path value that selects the in-memory engine
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Supported storage engines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory map (for testing/development)
    InMemory,
    /// SQLite database file
    Sqlite,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// In-memory storage configuration
    InMemory,
    /// SQLite file at the given path
    Sqlite(String),
}

impl StorageConfig {
    /// Creates an in-memory storage configuration
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Creates a SQLite storage configuration
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self::Sqlite(path.into())
    }

    /// Resolves a configured database path; `:memory:` selects the in-memory engine
    pub fn from_path(path: &str) -> Self {
        match path.trim() {
            IN_MEMORY_PATH => Self::InMemory,
            other => Self::Sqlite(other.to_string()),
        }
    }

    /// Returns the storage type
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Sqlite(_) => StorageType::Sqlite,
        }
    }
}

/// Factory for creating key-value store instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Opens a store based on the configuration
    pub fn create(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, DomainError> {
        match config {
            StorageConfig::InMemory => Ok(Arc::new(InMemoryKeyValueStore::new())),
            StorageConfig::Sqlite(path) => Ok(Arc::new(SqliteKeyValueStore::open(path)?)),
        }
    }

    /// Creates an in-memory store
    pub fn create_in_memory() -> Arc<InMemoryKeyValueStore> {
        Arc::new(InMemoryKeyValueStore::new())
    }
}
