//! # Database Migration System
//!
//! File-based migration runner for PostgreSQL. Migration files live in a
//! directory as `NNNN_name.sql`, are applied in version order inside a
//! transaction, and are tracked in the `schema_migrations` table with a
//! SHA-256 checksum so drift in already-applied files is detected.

use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::config::MigrationConfig;
use crate::error::{DatabaseError, DatabaseResult};

/// A migration discovered on disk
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub name: String,
    pub checksum: String,
    pub path: PathBuf,
}

/// Migration manager for handling database schema changes
pub struct MigrationManager {
    config: MigrationConfig,
    migration_dir: PathBuf,
}

impl MigrationManager {
    /// Create a new migration manager
    #[instrument(skip_all)]
    pub fn new(config: MigrationConfig, migration_dir: impl AsRef<Path>) -> DatabaseResult<Self> {
        let migration_dir = migration_dir.as_ref().to_path_buf();

        if !migration_dir.exists() {
            return Err(DatabaseError::Migration(format!(
                "migration directory does not exist: {}",
                migration_dir.display()
            )));
        }

        Ok(Self {
            config,
            migration_dir,
        })
    }

    /// Discover migration files on disk, sorted by version
    pub fn discover(&self) -> DatabaseResult<Vec<Migration>> {
        let mut migrations = Vec::new();

        for entry in fs::read_dir(&self.migration_dir)
            .map_err(|e| DatabaseError::Migration(format!("reading migration dir: {e}")))?
        {
            let entry = entry.map_err(|e| DatabaseError::Migration(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("sql") {
                continue;
            }

            let file_name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();

            let Some(migration) = parse_file_name(&file_name) else {
                warn!("Skipping unrecognized migration file: {}", path.display());
                continue;
            };

            let content = fs::read_to_string(&path)
                .map_err(|e| DatabaseError::Migration(format!("reading {}: {e}", path.display())))?;

            migrations.push(Migration {
                version: migration.0,
                name: migration.1,
                checksum: checksum(&content),
                path,
            });
        }

        migrations.sort_by_key(|m| m.version);

        // Duplicate versions are a packaging mistake, refuse to continue
        for pair in migrations.windows(2) {
            if pair[0].version == pair[1].version {
                return Err(DatabaseError::Migration(format!(
                    "duplicate migration version {}: {} and {}",
                    pair[0].version, pair[0].name, pair[1].name
                )));
            }
        }

        Ok(migrations)
    }

    /// Apply every pending migration in order
    #[instrument(skip(self, pool))]
    pub async fn run_migrations(&self, pool: &PgPool) -> DatabaseResult<usize> {
        self.ensure_migrations_table(pool).await?;

        let applied = self.load_applied(pool).await?;
        let discovered = self.discover()?;

        let mut ran = 0usize;
        for migration in discovered {
            if let Some(existing_checksum) = applied.get(&migration.version) {
                if self.config.verify_checksums && existing_checksum != &migration.checksum {
                    return Err(DatabaseError::Migration(format!(
                        "checksum mismatch for applied migration {} ({})",
                        migration.version, migration.name
                    )));
                }
                debug!("Migration {} already applied", migration.version);
                continue;
            }

            info!("Applying migration {} ({})", migration.version, migration.name);
            let started = Instant::now();

            let sql = fs::read_to_string(&migration.path)
                .map_err(|e| DatabaseError::Migration(e.to_string()))?;

            let mut tx = pool.begin().await?;
            sqlx::raw_sql(&sql)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    DatabaseError::Migration(format!(
                        "migration {} ({}) failed: {e}",
                        migration.version, migration.name
                    ))
                })?;

            sqlx::query(
                "INSERT INTO schema_migrations (version, name, checksum, execution_time_ms) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(migration.version)
            .bind(&migration.name)
            .bind(&migration.checksum)
            .bind(started.elapsed().as_millis() as i64)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            ran += 1;
        }

        info!("Migrations up to date ({} newly applied)", ran);
        Ok(ran)
    }

    async fn ensure_migrations_table(&self, pool: &PgPool) -> DatabaseResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (\
                version BIGINT PRIMARY KEY,\
                name TEXT NOT NULL,\
                checksum TEXT NOT NULL,\
                applied_at TIMESTAMPTZ NOT NULL DEFAULT now(),\
                execution_time_ms BIGINT\
            )",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn load_applied(&self, pool: &PgPool) -> DatabaseResult<HashMap<i64, String>> {
        let rows = sqlx::query("SELECT version, checksum FROM schema_migrations")
            .fetch_all(pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get::<i64, _>("version"), row.get::<String, _>("checksum")))
            .collect())
    }
}

/// Split `0003_create_market_tables` into `(3, "create_market_tables")`
fn parse_file_name(stem: &str) -> Option<(i64, String)> {
    let (version, name) = stem.split_once('_')?;
    let version: i64 = version.parse().ok()?;
    if name.is_empty() {
        return None;
    }
    Some((version, name.to_string()))
}

fn checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_versioned_file_names() {
        assert_eq!(
            parse_file_name("0001_create_companies"),
            Some((1, "create_companies".to_string()))
        );
        assert_eq!(
            parse_file_name("0012_add_statistics_fields"),
            Some((12, "add_statistics_fields".to_string()))
        );
        assert_eq!(parse_file_name("README"), None);
        assert_eq!(parse_file_name("abc_def"), None);
        assert_eq!(parse_file_name("0001_"), None);
    }

    #[test]
    fn checksum_is_stable_and_content_sensitive() {
        let a = checksum("CREATE TABLE t (id BIGINT);");
        let b = checksum("CREATE TABLE t (id BIGINT);");
        let c = checksum("CREATE TABLE t (id INT);");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
