//! Error types and result handling for storage operations.
//!
//! The storage layer distinguishes exactly one database failure from the
//! rest: a unique-constraint violation, which the message repository
//! translates into a non-error duplicate outcome. Everything else is an
//! unrecovered database fault.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for storage operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// A uniqueness constraint rejected the write.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::ConstraintViolation(db_err.to_string())
            },
            _ => Self::Database(err.to_string()),
        }
    }
}
