//! API Configuration Module
//!
//! Handles configuration loading for the Sahm API server. Supports
//! environment variables, configuration files, and runtime defaults.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::{info, warn};

/// Server configuration for the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server bind address and port
    pub bind_address: SocketAddr,

    /// Database connection URL
    pub database_url: String,

    /// JWT secret shared with the authentication service
    pub jwt_secret: String,

    /// Server environment (development, staging, production)
    pub environment: String,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Migration directory applied on startup
    pub migration_dir: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 8080),
            database_url: "postgresql://localhost/sahm".to_string(),
            jwt_secret: std::env::var("SAHM_API_JWT_SECRET").unwrap_or_else(|_| {
                if cfg!(test) {
                    "test-secret-value-for-unit-tests-do-not-use-in-prod".to_string()
                } else {
                    "change-this-jwt-secret-in-production".to_string()
                }
            }),
            environment: "development".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            request_timeout_secs: 30,
            migration_dir: "database/migrations".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment variables and config files
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("api.toml").required(false))
            .add_source(File::with_name("config/api.toml").required(false))
            .add_source(
                Environment::with_prefix("SAHM_API")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database_url", std::env::var("DATABASE_URL").ok())?
            .set_default("bind_address", "0.0.0.0:8080")?
            .set_default("database_url", "postgresql://localhost/sahm")?
            .set_default("jwt_secret", "change-this-jwt-secret-in-production")?
            .set_default("environment", "development")?
            .set_default("cors_origins", vec!["http://localhost:3000"])?
            .set_default("request_timeout_secs", 30)?
            .set_default("migration_dir", "database/migrations")?;

        // Parse CORS origins from environment variable
        if let Ok(cors_origins_str) = env::var("SAHM_API_CORS_ORIGINS") {
            let cors_origins: Vec<String> = cors_origins_str
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

            if !cors_origins.is_empty() {
                builder = builder.set_override("cors_origins", cors_origins)?;
            }
        }

        let config = builder.build()?;
        let api_config: ApiConfig = config.try_deserialize()?;

        api_config.validate()?;

        // Log configuration (without sensitive data)
        info!("API Configuration loaded:");
        info!("  Environment: {}", api_config.environment);
        info!("  Bind Address: {}", api_config.bind_address);
        info!("  Database: [REDACTED]");
        info!("  CORS Origins: {:?}", api_config.cors_origins);
        info!("  Request Timeout: {}s", api_config.request_timeout_secs);

        if api_config.jwt_secret == "change-this-jwt-secret-in-production" {
            warn!("Using default JWT secret! Set SAHM_API_JWT_SECRET in production!");
        }

        Ok(api_config)
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.jwt_secret.is_empty() {
            return Err(ConfigError::Message(
                "JWT secret cannot be empty".to_string(),
            ));
        }

        if self.database_url.is_empty() {
            return Err(ConfigError::Message(
                "Database URL cannot be empty".to_string(),
            ));
        }

        if self.cors_origins.is_empty() {
            warn!("CORS origins list is empty - this may cause issues in production");
        }

        Ok(())
    }

    /// Returns true if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Returns true if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
