use serde::Deserialize;

use crate::infrastructure::observability::MetricsConfig;

/// Environment variable holding the token signing secret
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// Environment variable holding the database path
pub const LOCAL_DB_PATH_ENV: &str = "LOCAL_DB_PATH";

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Token signing settings
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_access_token_ttl_minutes")]
    pub access_token_ttl_minutes: u64,
    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[hidden]")
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("refresh_token_ttl_days", &self.refresh_token_ttl_days)
            .finish()
    }
}

/// Key-value store location
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// SQLite file path, or `:memory:` for the in-memory engine
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_access_token_ttl_minutes() -> u64 {
    10
}

fn default_refresh_token_ttl_days() -> u64 {
    7
}

fn default_storage_path() -> String {
    "data/users.db".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_ttl_minutes: default_access_token_ttl_minutes(),
            refresh_token_ttl_days: default_refresh_token_ttl_days(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

/// Values read from the bare (unprefixed) environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub jwt_secret: Option<String>,
    pub db_path: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            jwt_secret: std::env::var(JWT_SECRET_ENV).ok(),
            db_path: std::env::var(LOCAL_DB_PATH_ENV).ok(),
        }
    }
}

impl AppConfig {
    /// Load from config files, `APP__` variables and the bare overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with_overrides(EnvOverrides::from_env())
    }

    pub fn load_with_overrides(overrides: EnvOverrides) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("auth.jwt_secret", overrides.jwt_secret)?
            .set_override_option("storage.path", overrides.db_path)?
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(config::ConfigError::Message(format!(
                "{} must be set to a non-empty value",
                JWT_SECRET_ENV
            )));
        }

        if self.auth.access_token_ttl_minutes == 0 || self.auth.refresh_token_ttl_days == 0 {
            return Err(config::ConfigError::Message(
                "Token lifetimes must be greater than zero".to_string(),
            ));
        }

        if self.storage.path.trim().is_empty() {
            return Err(config::ConfigError::Message(format!(
                "{} must not be empty",
                LOCAL_DB_PATH_ENV
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.auth.access_token_ttl_minutes, 10);
        assert_eq!(config.auth.refresh_token_ttl_days, 7);
        assert_eq!(config.storage.path, "data/users.db");
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let config = AppConfig::default();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_blank_secret_is_rejected() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "   ".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = AppConfig::load_with_overrides(EnvOverrides {
            jwt_secret: Some("test-secret".to_string()),
            db_path: Some(":memory:".to_string()),
        })
        .unwrap();

        assert_eq!(config.auth.jwt_secret, "test-secret");
        assert_eq!(config.storage.path, ":memory:");
    }

    #[test]
    fn test_secret_is_hidden_from_debug() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "super-secret".to_string();

        let output = format!("{:?}", config);
        assert!(!output.contains("super-secret"));
    }

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
