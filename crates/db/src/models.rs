//! Database models mapping to the account schema.

use crate::error::{DbError, DbResult};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User account record.
///
/// `user_id` is immutable once assigned; `created_*`/`updated_*` are audit
/// attributes stamped by the use-case layer, never by callers directly.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: i64,
    pub email: String,
    /// Password hash (bcrypt). Never a plaintext password.
    pub password: String,
    pub fullname: String,
    pub phone_number: String,
    pub user_type: String,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub created_by: String,
    pub updated_at: OffsetDateTime,
    pub updated_by: String,
}

/// Insert payload for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    /// Password hash (bcrypt).
    pub password: String,
    pub fullname: String,
    pub phone_number: String,
    pub user_type: String,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub created_by: String,
}

/// Sparse partial-update payload.
///
/// `None` fields must not overwrite stored column values; the store applies
/// each optional column as `col = COALESCE($n, col)`. The audit stamps are
/// mandatory and always written.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub email: Option<String>,
    pub fullname: Option<String>,
    pub phone_number: Option<String>,
    pub user_type: Option<String>,
    pub updated_at: OffsetDateTime,
    pub updated_by: String,
}

impl UserChanges {
    /// An empty descriptor carrying only the audit stamps.
    pub fn stamped(updated_at: OffsetDateTime, updated_by: impl Into<String>) -> Self {
        Self {
            email: None,
            fullname: None,
            phone_number: None,
            user_type: None,
            updated_at,
            updated_by: updated_by.into(),
        }
    }

    /// Whether any business field (beyond the audit stamps) is present.
    pub fn has_field_changes(&self) -> bool {
        self.email.is_some()
            || self.fullname.is_some()
            || self.phone_number.is_some()
            || self.user_type.is_some()
    }
}

/// Single-field status transition payload.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub is_active: bool,
    pub updated_at: OffsetDateTime,
    pub updated_by: String,
}

/// Row-locking options for a read that precedes a mutation.
///
/// `for_update` requests a blocking row lock held until the surrounding
/// transaction ends; `for_update_no_wait` requests a lock that fails
/// immediately with [`DbError::RowLocked`] instead of waiting. The two modes
/// are mutually exclusive: requesting both is a configuration error caught
/// by [`LockingOpt::validate`] before any statement is issued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LockingOpt {
    pub for_update: bool,
    pub for_update_no_wait: bool,
}

impl LockingOpt {
    /// No row lock.
    pub fn none() -> Self {
        Self::default()
    }

    /// Blocking row lock (`FOR UPDATE`).
    pub fn for_update() -> Self {
        Self {
            for_update: true,
            for_update_no_wait: false,
        }
    }

    /// Non-blocking row lock (`FOR UPDATE NOWAIT`).
    pub fn for_update_no_wait() -> Self {
        Self {
            for_update: false,
            for_update_no_wait: true,
        }
    }

    /// Reject contradictory lock requests. Must be called before building
    /// the statement.
    pub fn validate(&self) -> DbResult<()> {
        if self.for_update && self.for_update_no_wait {
            return Err(DbError::InvalidLockOption);
        }
        Ok(())
    }

    /// Whether any row lock was requested.
    pub fn is_locking(&self) -> bool {
        self.for_update || self.for_update_no_wait
    }

    /// SQL clause appended to a PostgreSQL locking read.
    pub(crate) fn pg_clause(&self) -> &'static str {
        if self.for_update {
            " FOR UPDATE"
        } else if self.for_update_no_wait {
            " FOR UPDATE NOWAIT"
        } else {
            ""
        }
    }
}
