//! Errors raised by the repositories.
//!
//! SQLite failures are classified by constraint kind so the HTTP layer can
//! tell a duplicate email (409) from a broken connection (500). Business
//! rules that fail inside a transaction (stock, cancelled sale) travel
//! through unchanged as [`DbError::Core`].

use pdv_core::{CoreError, ValidationError};
use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Lookup by id matched no row, or a guarded UPDATE touched nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// `field` is whatever SQLite reports (`users.email`) unless a
    /// repository rewrites it with [`DbError::duplicate`].
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored value no longer decodes, e.g. hand-edited settings JSON.
    #[error("Corrupt data in {0}")]
    Corrupt(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

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

/// SQLite words constraint failures as `UNIQUE constraint failed: t.col`;
/// the part after the colon names the offending column.
fn constraint_target(message: &str) -> String {
    message
        .split_once(": ")
        .map(|(_, target)| target.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    DbError::duplicate(constraint_target(db_err.message()), "unknown")
                }
                ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                    message: db_err.message().to_string(),
                },
                _ => DbError::QueryFailed(db_err.message().to_string()),
            },
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Core(CoreError::Validation(err))
    }
}

pub type DbResult<T> = Result<T, DbError>;
