//! # Database Configuration
//!
//! Configuration structures for the PostgreSQL connection pool and the
//! migration runner. Environment-based configuration with defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Database configuration for PostgreSQL connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    pub min_connections: u32,
    /// Connection acquisition timeout
    pub acquire_timeout: Duration,
    /// Connection idle timeout
    pub idle_timeout: Duration,
    /// Connection max lifetime
    pub max_lifetime: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost:5432/sahm".to_string()),
            max_connections: 20,
            min_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Migration runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Path to migration files
    pub migration_dir: String,
    /// Verify checksums of already-applied migrations
    pub verify_checksums: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            migration_dir: "database/migrations".to_string(),
            verify_checksums: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_database_config() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 5);
        assert!(config.database_url.starts_with("postgres"));
    }

    #[test]
    fn test_default_migration_config() {
        let config = MigrationConfig::default();
        assert_eq!(config.migration_dir, "database/migrations");
        assert!(config.verify_checksums);
    }
}
