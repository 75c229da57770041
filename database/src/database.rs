//! # PostgreSQL Database Integration
//!
//! PostgreSQL integration using SQLx with connection pooling.

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info, instrument};

use crate::config::DatabaseConfig;
use crate::error::DatabaseResult;

/// Database manager for PostgreSQL operations
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Create a new database manager with the given configuration
    #[instrument(skip(config))]
    pub async fn new(config: DatabaseConfig) -> DatabaseResult<Self> {
        info!("Initializing database connection pool");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(&config.database_url)
            .await?;

        // Test the connection
        let version: String = sqlx::query_scalar("SELECT version()")
            .fetch_one(&pool)
            .await?;

        info!("Connected to PostgreSQL: {}", version);

        Ok(Self { pool })
    }

    /// Wrap an existing pool, used by integration tests
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> DatabaseResult<()> {
        debug!("Performing database health check");

        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(())
    }

    /// Close all pool connections
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }
}
