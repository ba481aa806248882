//! User repository trait.

use crate::error::DbResult;
use crate::models::{LockingOpt, NewUser, StatusChange, UserChanges, UserRow};
use async_trait::async_trait;

/// Record accessor for user accounts.
///
/// Implemented both by pool-bound stores and by transaction-bound accessors,
/// so a guarded mutation can run the same operations inside an open
/// transaction (see [`crate::store::UserStore::atomic`]).
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a new account, returning the generated identity.
    ///
    /// A unique-constraint violation on the email column surfaces as
    /// `DbError::AlreadyExists`.
    async fn create_user(&self, user: &NewUser) -> DbResult<i64>;

    /// Fetch an account by identity, optionally acquiring a row lock.
    ///
    /// Returns `DbError::NotFound` if no row matches, and
    /// `DbError::RowLocked` when a non-blocking lock cannot be acquired
    /// immediately. A contradictory `locking` value fails locally with
    /// `DbError::InvalidLockOption` before any statement is issued.
    async fn get_user_by_id(&self, user_id: i64, locking: LockingOpt) -> DbResult<UserRow>;

    /// Fetch an account by its unique email.
    async fn get_user_by_email(&self, email: &str) -> DbResult<UserRow>;

    /// Whether an account with this email exists.
    ///
    /// A query failure is an `Err`, never a silent `false`.
    async fn email_exists(&self, email: &str) -> DbResult<bool>;

    /// Apply a sparse update to the columns present in `changes`.
    ///
    /// Absent fields round-trip unchanged. Zero affected rows is
    /// `DbError::NotFound`, never a silent no-op.
    async fn update_user_by_id(&self, user_id: i64, changes: &UserChanges) -> DbResult<()>;

    /// Flip the active flag, stamping the audit columns.
    ///
    /// Same zero-rows rule as [`UserRepo::update_user_by_id`].
    async fn update_user_status(&self, user_id: i64, change: &StatusChange) -> DbResult<()>;
}
