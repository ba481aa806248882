//! User store trait and the SQLite implementation.

use crate::error::{DbError, DbResult};
use crate::models::{LockingOpt, NewUser, StatusChange, UserChanges, UserRow};
use crate::repos::UserRepo;
use crate::schema_statements;
use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;

/// Transaction isolation levels accepted by [`UserStore::atomic`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// Statement issued at the start of the transaction (PostgreSQL).
    pub(crate) fn set_statement(&self) -> &'static str {
        match self {
            Self::ReadCommitted => "SET TRANSACTION ISOLATION LEVEL READ COMMITTED",
            Self::RepeatableRead => "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ",
            Self::Serializable => "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE",
        }
    }
}

/// Options applied to an atomic block.
#[derive(Clone, Copy, Debug, Default)]
pub struct TxOptions {
    /// Isolation level; the engine default when `None`.
    pub isolation: Option<IsolationLevel>,
    /// Per-statement timeout inside the transaction. Bounds how long a
    /// blocking-lock read may wait for a competing transaction.
    pub statement_timeout_ms: Option<u64>,
}

/// A caller-supplied mutation sequence run against a transaction-bound
/// [`UserRepo`]. Returning `Err` rolls the transaction back.
pub type AtomicUserOp =
    Box<dyn for<'t> FnOnce(&'t dyn UserRepo) -> BoxFuture<'t, DbResult<()>> + Send>;

/// Combined user store trait.
#[async_trait]
pub trait UserStore: UserRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> DbResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> DbResult<()>;

    /// Run `op` atomically: every repository call inside `op` sees the same
    /// transaction, and either all of them commit or none do.
    ///
    /// If `op` fails, the transaction is rolled back and the operation's
    /// error is surfaced; a rollback failure on that path is logged, never
    /// substituted for the original error. If `op` succeeds, the commit
    /// failure (if any) is the operation's error. Dropping the future
    /// mid-flight (caller cancellation) releases the transaction via the
    /// driver's drop-rollback.
    async fn atomic(&self, options: TxOptions, op: AtomicUserOp) -> DbResult<()>;
}

/// SQLite schema (embedded).
const SQLITE_SCHEMA: &str = include_str!("sqlite_schema.sql");

/// SQLite-based user store.
///
/// SQLite has no row-level locks: `LockingOpt` values are still validated,
/// but lock clauses are inapplicable and serialization relies on the
/// single-connection pool plus the busy timeout. Use PostgreSQL wherever
/// blocking/non-blocking row-lock semantics matter; SQLite is intended for
/// tests and single-node deployments.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store, creating and migrating the database file.
    /// The special path `:memory:` opens an in-memory database.
    pub async fn new(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();

        let opts = if path == Path::new(":memory:") {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
                .create_if_missing(true)
        }
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .foreign_keys(true)
        // Prevent transient "database is locked" errors under concurrent access.
        .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection
            // avoids persistent "database is locked" failures under axum/test
            // concurrency and is what serializes competing guarded mutations.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

// Shared statement builders, usable against the pool or an open transaction.

async fn insert_user<'e, E>(ex: E, user: &NewUser) -> DbResult<i64>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO users \
         (email, password, fullname, phone_number, user_type, is_active, \
          created_at, created_by, updated_at, updated_by) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.email)
    .bind(&user.password)
    .bind(&user.fullname)
    .bind(&user.phone_number)
    .bind(&user.user_type)
    .bind(user.is_active)
    .bind(user.created_at)
    .bind(&user.created_by)
    .bind(user.created_at)
    .bind(&user.created_by)
    .execute(ex)
    .await
    .map_err(|e| DbError::on_write(e, &format!("user email '{}'", user.email)))?;

    Ok(result.last_insert_rowid())
}

async fn fetch_user_by_id<'e, E>(ex: E, user_id: i64, locking: LockingOpt) -> DbResult<UserRow>
where
    E: sqlx::SqliteExecutor<'e>,
{
    locking.validate()?;
    // Row-lock clauses do not exist in SQLite; the single-connection pool
    // serializes writers instead.
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(ex)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("user {user_id}")))
}

async fn fetch_user_by_email<'e, E>(ex: E, email: &str) -> DbResult<UserRow>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(ex)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("user email '{email}'")))
}

async fn email_exists<'e, E>(ex: E, email: &str) -> DbResult<bool>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
        .bind(email)
        .fetch_one(ex)
        .await?;
    Ok(exists)
}

async fn apply_user_changes<'e, E>(ex: E, user_id: i64, changes: &UserChanges) -> DbResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE users SET \
         email = COALESCE(?, email), \
         fullname = COALESCE(?, fullname), \
         phone_number = COALESCE(?, phone_number), \
         user_type = COALESCE(?, user_type), \
         updated_at = ?, \
         updated_by = ? \
         WHERE user_id = ?",
    )
    .bind(changes.email.as_deref())
    .bind(changes.fullname.as_deref())
    .bind(changes.phone_number.as_deref())
    .bind(changes.user_type.as_deref())
    .bind(changes.updated_at)
    .bind(&changes.updated_by)
    .bind(user_id)
    .execute(ex)
    .await
    .map_err(|e| {
        DbError::on_write(
            e,
            &format!("user email '{}'", changes.email.as_deref().unwrap_or("")),
        )
    })?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound(format!("user {user_id}")));
    }
    Ok(())
}

async fn apply_status_change<'e, E>(ex: E, user_id: i64, change: &StatusChange) -> DbResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result =
        sqlx::query("UPDATE users SET is_active = ?, updated_at = ?, updated_by = ? WHERE user_id = ?")
            .bind(change.is_active)
            .bind(change.updated_at)
            .bind(&change.updated_by)
            .bind(user_id)
            .execute(ex)
            .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound(format!("user {user_id}")));
    }
    Ok(())
}

#[async_trait]
impl UserRepo for SqliteStore {
    async fn create_user(&self, user: &NewUser) -> DbResult<i64> {
        insert_user(&self.pool, user).await
    }

    async fn get_user_by_id(&self, user_id: i64, locking: LockingOpt) -> DbResult<UserRow> {
        fetch_user_by_id(&self.pool, user_id, locking).await
    }

    async fn get_user_by_email(&self, email: &str) -> DbResult<UserRow> {
        fetch_user_by_email(&self.pool, email).await
    }

    async fn email_exists(&self, email: &str) -> DbResult<bool> {
        email_exists(&self.pool, email).await
    }

    async fn update_user_by_id(&self, user_id: i64, changes: &UserChanges) -> DbResult<()> {
        apply_user_changes(&self.pool, user_id, changes).await
    }

    async fn update_user_status(&self, user_id: i64, change: &StatusChange) -> DbResult<()> {
        apply_status_change(&self.pool, user_id, change).await
    }
}

/// Transaction-bound accessor handed to [`UserStore::atomic`] callbacks.
///
/// The live transaction sits behind an async mutex so the `&self` trait
/// methods can drive the `&mut` connection; the handle is exclusively owned
/// by one atomic block and consumed on commit or rollback.
struct SqliteTxRepo {
    tx: Mutex<sqlx::Transaction<'static, Sqlite>>,
}

#[async_trait]
impl UserRepo for SqliteTxRepo {
    async fn create_user(&self, user: &NewUser) -> DbResult<i64> {
        let mut tx = self.tx.lock().await;
        insert_user(&mut **tx, user).await
    }

    async fn get_user_by_id(&self, user_id: i64, locking: LockingOpt) -> DbResult<UserRow> {
        let mut tx = self.tx.lock().await;
        fetch_user_by_id(&mut **tx, user_id, locking).await
    }

    async fn get_user_by_email(&self, email: &str) -> DbResult<UserRow> {
        let mut tx = self.tx.lock().await;
        fetch_user_by_email(&mut **tx, email).await
    }

    async fn email_exists(&self, email: &str) -> DbResult<bool> {
        let mut tx = self.tx.lock().await;
        email_exists(&mut **tx, email).await
    }

    async fn update_user_by_id(&self, user_id: i64, changes: &UserChanges) -> DbResult<()> {
        let mut tx = self.tx.lock().await;
        apply_user_changes(&mut **tx, user_id, changes).await
    }

    async fn update_user_status(&self, user_id: i64, change: &StatusChange) -> DbResult<()> {
        let mut tx = self.tx.lock().await;
        apply_status_change(&mut **tx, user_id, change).await
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn migrate(&self) -> DbResult<()> {
        for statement in schema_statements(SQLITE_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn atomic(&self, _options: TxOptions, op: AtomicUserOp) -> DbResult<()> {
        // SQLite has neither isolation-level selection per transaction nor
        // statement timeouts; options are accepted for interface parity.
        let tx = self.pool.begin().await?;
        let repo = SqliteTxRepo { tx: Mutex::new(tx) };

        let outcome = op(&repo).await;
        let tx = repo.tx.into_inner();

        match outcome {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(op_err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(
                        error = %rollback_err,
                        "rollback failed; surfacing original operation error"
                    );
                }
                Err(op_err)
            }
        }
    }
}
