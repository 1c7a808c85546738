//! User Auth API
//!
//! Account registration, password login and JWT session management over an
//! embedded key-value store:
//! - Argon2id password hashing
//! - Short-lived access tokens with rotating refresh tokens
//! - SQLite or in-memory storage

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use infrastructure::auth::{TokenConfig, TokenIssuer};
use infrastructure::storage::{StorageConfig, StorageFactory};
use infrastructure::user::{Argon2Hasher, KvCredentialStore};

/// Build application state from configuration
pub fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage = StorageConfig::from_path(&config.storage.path);
    let kv = StorageFactory::create(&storage)?;
    tracing::info!(storage_type = ?storage.storage_type(), "Storage initialized");

    let store = Arc::new(KvCredentialStore::new(kv));
    let hasher = Arc::new(Argon2Hasher::new());

    let token_config = TokenConfig::new(config.auth.jwt_secret.clone())
        .with_access_ttl_minutes(config.auth.access_token_ttl_minutes)
        .with_refresh_ttl_days(config.auth.refresh_token_ttl_days);
    let tokens = Arc::new(TokenIssuer::new(token_config)?);

    Ok(AppState::new(store, hasher, tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::infrastructure::storage::IN_MEMORY_PATH;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.path = IN_MEMORY_PATH.to_string();
        config.auth = AuthConfig {
            jwt_secret: "test-secret".to_string(),
            ..AuthConfig::default()
        };
        config
    }

    #[tokio::test]
    async fn test_create_app_state_in_memory() {
        let state = create_app_state(&test_config()).unwrap();

        assert!(state.credential_store.health_check().await.is_ok());
        assert!(state.user_service.list().await.unwrap().is_empty());
    }

    #[test]
    fn test_create_app_state_rejects_empty_secret() {
        let mut config = test_config();
        config.auth.jwt_secret = String::new();

        assert!(create_app_state(&config).is_err());
    }
}
