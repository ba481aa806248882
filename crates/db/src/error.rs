//! User store error types.

use thiserror::Error;

/// User store operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("row locked: {0}")]
    RowLocked(String),

    #[error("invalid locking option: blocking and non-blocking locks are mutually exclusive")]
    InvalidLockOption,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// PostgreSQL `lock_not_available`, raised by `FOR UPDATE NOWAIT` when the
/// row is already locked by another transaction.
const PG_LOCK_NOT_AVAILABLE: &str = "55P03";

impl DbError {
    /// Translate a write-path driver error, surfacing unique-constraint
    /// violations as `AlreadyExists`.
    pub(crate) fn on_write(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::AlreadyExists(what.to_string());
        }
        Self::Database(err)
    }

    /// Translate a locking-read driver error, surfacing a failed NOWAIT lock
    /// acquisition as `RowLocked`.
    pub(crate) fn on_locking_read(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.code().as_deref() == Some(PG_LOCK_NOT_AVAILABLE)
        {
            return Self::RowLocked(what.to_string());
        }
        Self::Database(err)
    }
}

/// Result type for user store operations.
pub type DbResult<T> = std::result::Result<T, DbError>;
