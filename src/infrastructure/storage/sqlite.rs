//! SQLite-backed key-value store

use std::fmt::Debug;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::storage::KeyValueStore;
use crate::domain::DomainError;

/// Persistent key-value store kept in a single SQLite table
///
/// All statements run on tokio's blocking pool. The connection is shared
/// behind a mutex, so every trait call is one serialized statement.
#[derive(Clone)]
pub struct SqliteKeyValueStore {
    conn: Arc<Mutex<Connection>>,
    location: String,
}

impl Debug for SqliteKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteKeyValueStore")
            .field("location", &self.location)
            .finish()
    }
}

impl SqliteKeyValueStore {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainError::storage(format!(
                    "Failed to create database directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            DomainError::storage(format!(
                "Failed to open database '{}': {}",
                path.display(),
                e
            ))
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(map_sqlite_error)?;

        Self::with_connection(conn, path.display().to_string())
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, DomainError> {
        let conn = Connection::open_in_memory().map_err(map_sqlite_error)?;
        Self::with_connection(conn, ":memory:".to_string())
    }

    fn with_connection(conn: Connection, location: String) -> Result<Self, DomainError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            );",
        )
        .map_err(map_sqlite_error)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location,
        })
    }

    /// Where the data lives, for logging
    pub fn location(&self) -> &str {
        &self.location
    }

    async fn run<T, F>(&self, op: F) -> Result<T, DomainError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|e| {
                DomainError::storage(format!("Failed to acquire connection lock: {}", e))
            })?;
            op(&guard).map_err(map_sqlite_error)
        })
        .await
        .map_err(|e| DomainError::storage(format!("Storage task failed: {}", e)))?
    }
}

fn map_sqlite_error(e: rusqlite::Error) -> DomainError {
    DomainError::storage(format!("SQLite error: {}", e))
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let key = key.to_string();

        self.run(move |conn| {
            conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let key = key.to_string();
        let value = value.to_string();

        self.run(move |conn| {
            conn.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map(|_| ())
        })
        .await
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, DomainError> {
        let key = key.to_string();
        let value = value.to_string();

        self.run(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map(|inserted| inserted == 1)
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let key = key.to_string();

        self.run(move |conn| {
            conn.execute("DELETE FROM kv WHERE key = ?1", params![key])
                .map(|removed| removed > 0)
        })
        .await
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, DomainError> {
        let prefix = prefix.to_string();

        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT key, value FROM kv
                 WHERE substr(key, 1, length(?1)) = ?1
                 ORDER BY key",
            )?;

            let rows = stmt.query_map(params![prefix], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect()
        })
        .await
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.run(|conn| conn.query_row("SELECT 1", [], |_| Ok(())))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = SqliteKeyValueStore::open_in_memory().unwrap();

        store.set("user:1", "{\"a\":1}").await.unwrap();
        assert_eq!(
            store.get("user:1").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        store.set("user:1", "{\"a\":2}").await.unwrap();
        assert_eq!(
            store.get("user:1").await.unwrap().as_deref(),
            Some("{\"a\":2}")
        );

        assert!(store.delete("user:1").await.unwrap());
        assert!(!store.delete("user:1").await.unwrap());
        assert_eq!(store.get("user:1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_if_absent() {
        let store = SqliteKeyValueStore::open_in_memory().unwrap();

        assert!(store.set_if_absent("email:a@x.com", "1").await.unwrap());
        assert!(!store.set_if_absent("email:a@x.com", "2").await.unwrap());
        assert_eq!(
            store.get("email:a@x.com").await.unwrap().as_deref(),
            Some("1")
        );
    }

    #[tokio::test]
    async fn test_scan_prefix() {
        let store = SqliteKeyValueStore::open_in_memory().unwrap();

        store.set("user:b", "2").await.unwrap();
        store.set("user:a", "1").await.unwrap();
        store.set("refresh_token:a", "t").await.unwrap();
        store.set("user_%", "x").await.unwrap();

        let entries = store.scan_prefix("user:").await.unwrap();
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();

        assert_eq!(keys, vec!["user:a", "user:b"]);
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("users.db");

        {
            let store = SqliteKeyValueStore::open(&path).unwrap();
            store.set("user:1", "persisted").await.unwrap();
        }

        let reopened = SqliteKeyValueStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("user:1").await.unwrap().as_deref(),
            Some("persisted")
        );
    }

    #[tokio::test]
    async fn test_ping() {
        let store = SqliteKeyValueStore::open_in_memory().unwrap();
        assert!(store.ping().await.is_ok());
    }
}
