//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, EnvOverrides, LogFormat, LoggingConfig, ServerConfig,
    StorageSettings, JWT_SECRET_ENV, LOCAL_DB_PATH_ENV,
};
