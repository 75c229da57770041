//! Database error types
//!
//! This module provides error types for database operations.

use thiserror::Error;

/// Database-related errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("SQL error: {0}")]
    Sql(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return DatabaseError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                };
            }
        }
        DatabaseError::Sql(err)
    }
}

impl DatabaseError {
    /// True when the error came from a duplicate-key insert or update.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DatabaseError::UniqueViolation { .. })
    }
}

/// Type alias for database results
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_sql_variant() {
        let err = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(!err.is_unique_violation());
        assert!(matches!(err, DatabaseError::Sql(_)));
    }

    #[test]
    fn unique_violation_reports_itself() {
        let err = DatabaseError::UniqueViolation {
            constraint: "companies_symbol_key".to_string(),
        };
        assert!(err.is_unique_violation());
        assert!(err.to_string().contains("companies_symbol_key"));
    }
}
