//! # Storage Error Types
//!
//! Two layers of errors leave this crate. [`DbError`] categorizes raw
//! `sqlx::Error`s (missing rows, constraint violations, pool trouble).
//! [`EngineError`] is what the transactional engines return: either a domain
//! rejection ([`CoreError`], the transaction rolled back) or a [`DbError`].
//! Keeping the two arms distinguishable lets callers show the former to
//! users and page operators on the latter.

use shopkit_core::error::{CoreError, ValidationError};
use thiserror::Error;

/// Categorized storage failures.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row matched. Also covers rows owned by another business, which
    /// scoped queries cannot see.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected a write (duplicate phone, duplicate report
    /// period, ...). `field` names the index's table.column when SQLite
    /// reports it.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A write referenced a row that does not exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Opening the database or the pool failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A schema migration did not apply.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite rejected a statement for a non-constraint reason.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Every pooled connection was busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Anything sqlx reports that fits no category above.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            // SQLite surfaces constraint failures as Database errors with
            // fixed message prefixes; the UNIQUE form carries table.column.
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for repository operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors surfaced by the transactional engines (checkout, receiving,
/// transfer, reporting).
#[derive(Debug, Error)]
pub enum EngineError {
    /// A domain rule rejected the operation. The transaction was rolled back.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// The storage layer failed.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Db(DbError::from(err))
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Domain(CoreError::Validation(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================
