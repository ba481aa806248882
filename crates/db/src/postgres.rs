//! PostgreSQL-based user store implementation.

use crate::error::{DbError, DbResult};
use crate::models::{LockingOpt, NewUser, StatusChange, UserChanges, UserRow};
use crate::repos::UserRepo;
use crate::schema_statements;
use crate::store::{AtomicUserOp, TxOptions, UserStore};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use tokio::sync::Mutex;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

/// PostgreSQL-based user store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> DbResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Create a new PostgreSQL store from individual connection parameters.
    ///
    /// This allows credentials to be passed separately, enabling better
    /// secret management (e.g., passwords via environment variables).
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> DbResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        // Log connection info without password
        tracing::info!(host = host, port = port, database = database, "Connecting to PostgreSQL");

        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> DbResult<Self> {
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", timeout_ms.to_string())]);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

// Shared statement builders, usable against the pool or an open transaction.

async fn insert_user<'e, E>(ex: E, user: &NewUser) -> DbResult<i64>
where
    E: sqlx::PgExecutor<'e>,
{
    let user_id: i64 = sqlx::query_scalar(
        "INSERT INTO users \
         (email, password, fullname, phone_number, user_type, is_active, \
          created_at, created_by, updated_at, updated_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $7, $8) \
         RETURNING user_id",
    )
    .bind(&user.email)
    .bind(&user.password)
    .bind(&user.fullname)
    .bind(&user.phone_number)
    .bind(&user.user_type)
    .bind(user.is_active)
    .bind(user.created_at)
    .bind(&user.created_by)
    .fetch_one(ex)
    .await
    .map_err(|e| DbError::on_write(e, &format!("user email '{}'", user.email)))?;

    Ok(user_id)
}

async fn fetch_user_by_id<'e, E>(ex: E, user_id: i64, locking: LockingOpt) -> DbResult<UserRow>
where
    E: sqlx::PgExecutor<'e>,
{
    // Reject contradictory lock requests before any statement is issued.
    locking.validate()?;

    let query = format!(
        "SELECT * FROM users WHERE user_id = $1{}",
        locking.pg_clause()
    );
    sqlx::query_as::<_, UserRow>(&query)
        .bind(user_id)
        .fetch_optional(ex)
        .await
        .map_err(|e| DbError::on_locking_read(e, &format!("user {user_id}")))?
        .ok_or_else(|| DbError::NotFound(format!("user {user_id}")))
}

async fn fetch_user_by_email<'e, E>(ex: E, email: &str) -> DbResult<UserRow>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(ex)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("user email '{email}'")))
}

async fn email_exists<'e, E>(ex: E, email: &str) -> DbResult<bool>
where
    E: sqlx::PgExecutor<'e>,
{
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(ex)
        .await?;
    Ok(exists)
}

async fn apply_user_changes<'e, E>(ex: E, user_id: i64, changes: &UserChanges) -> DbResult<()>
where
    E: sqlx::PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE users SET \
         email = COALESCE($2, email), \
         fullname = COALESCE($3, fullname), \
         phone_number = COALESCE($4, phone_number), \
         user_type = COALESCE($5, user_type), \
         updated_at = $6, \
         updated_by = $7 \
         WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(changes.email.as_deref())
    .bind(changes.fullname.as_deref())
    .bind(changes.phone_number.as_deref())
    .bind(changes.user_type.as_deref())
    .bind(changes.updated_at)
    .bind(&changes.updated_by)
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
    E: sqlx::PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE users SET is_active = $2, updated_at = $3, updated_by = $4 WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(change.is_active)
    .bind(change.updated_at)
    .bind(&change.updated_by)
    .execute(ex)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound(format!("user {user_id}")));
    }
    Ok(())
}

#[async_trait]
impl UserRepo for PostgresStore {
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
/// Owns the live transaction for the duration of one atomic block. Row locks
/// acquired through it (`FOR UPDATE` / `FOR UPDATE NOWAIT`) are held until
/// the block commits or rolls back.
struct PgTxRepo {
    tx: Mutex<sqlx::Transaction<'static, Postgres>>,
}

#[async_trait]
impl UserRepo for PgTxRepo {
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
impl UserStore for PostgresStore {
    async fn migrate(&self) -> DbResult<()> {
        for statement in schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn atomic(&self, options: TxOptions, op: AtomicUserOp) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        // Isolation must be set before the transaction's first query.
        if let Some(level) = options.isolation {
            sqlx::query(level.set_statement()).execute(&mut *tx).await?;
        }
        if let Some(timeout_ms) = options.statement_timeout_ms {
            // SET LOCAL scopes the timeout to this transaction only.
            sqlx::query(&format!("SET LOCAL statement_timeout = {timeout_ms}"))
                .execute(&mut *tx)
                .await?;
        }

        let repo = PgTxRepo { tx: Mutex::new(tx) };
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
