//! Server configuration.
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. `pdv.toml` in the working directory (optional)
//! 3. `PDV_*` environment variables (`PDV_PORT`, `PDV_JWT_SECRET`, ...)

use std::net::SocketAddr;

use pdv_core::SecuritySettings;
use serde::{Deserialize, Serialize};

const DEV_JWT_SECRET: &str = "pdv-dev-secret-change-in-production";

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Maximum pool connections
    pub max_connections: u32,

    /// Secret for signing session tokens
    pub jwt_secret: String,

    /// Token lifetime in seconds
    pub token_lifetime_secs: i64,

    /// Inactivity timeout used until one is saved in settings
    pub inactivity_timeout_minutes: i64,

    /// Warning window used until one is saved in settings
    pub warning_minutes: i64,

    /// Allow any origin (development frontends)
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_path: "./pdv.db".to_string(),
            max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_lifetime_secs: 12 * 60 * 60,
            inactivity_timeout_minutes: 30,
            warning_minutes: 5,
            cors_permissive: true,
        }
    }
}

impl ServerConfig {
    /// Loads defaults, then `pdv.toml`, then `PDV_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let settings = config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_path", defaults.database_path)?
            .set_default("max_connections", i64::from(defaults.max_connections))?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("token_lifetime_secs", defaults.token_lifetime_secs)?
            .set_default("inactivity_timeout_minutes", defaults.inactivity_timeout_minutes)?
            .set_default("warning_minutes", defaults.warning_minutes)?
            .set_default("cors_permissive", defaults.cors_permissive)?
            .add_source(config::File::with_name("pdv").required(false))
            .add_source(config::Environment::with_prefix("PDV").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;

        if config.jwt_secret == DEV_JWT_SECRET {
            tracing::warn!("Using the development JWT secret; set PDV_JWT_SECRET in production");
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("token_lifetime_secs".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        self.default_security()
            .validate()
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        Ok(())
    }

    /// Inactivity settings from configuration.
    pub fn default_security(&self) -> SecuritySettings {
        SecuritySettings {
            inactivity_timeout_minutes: self.inactivity_timeout_minutes,
            warning_minutes: self.warning_minutes,
            warnings_enabled: true,
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("host".to_string()))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
