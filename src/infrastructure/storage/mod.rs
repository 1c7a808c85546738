//! Storage infrastructure - Key-value engine implementations

mod factory;
mod in_memory;
mod sqlite;

pub use factory::{StorageConfig, StorageFactory, StorageType, IN_MEMORY_PATH};
pub use in_memory::InMemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;
