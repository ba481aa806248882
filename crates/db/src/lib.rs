//! User store abstraction and implementations for roster.
//!
//! This crate provides the persistence layer:
//! - The [`repos::UserRepo`] record accessor, implemented identically by
//!   pool-bound stores and transaction-bound accessors
//! - The [`store::UserStore`] combined trait with the `atomic` transaction
//!   coordinator (guarded read-lock-modify-write mutations)
//! - PostgreSQL and SQLite backends

pub mod error;
pub mod models;
pub mod postgres;
pub mod repos;
pub mod store;

pub use error::{DbError, DbResult};
pub use models::{LockingOpt, NewUser, StatusChange, UserChanges, UserRow};
pub use postgres::PostgresStore;
pub use repos::UserRepo;
pub use store::{AtomicUserOp, IsolationLevel, SqliteStore, TxOptions, UserStore};

use roster_core::config::DatabaseConfig;
use std::sync::Arc;

/// Create a user store from configuration.
pub async fn from_config(config: &DatabaseConfig) -> DbResult<Arc<dyn UserStore>> {
    match config {
        DatabaseConfig::Sqlite { path } => {
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store) as Arc<dyn UserStore>)
        }
        DatabaseConfig::Postgres {
            url,
            host,
            port,
            username,
            password,
            database,
            max_connections,
            statement_timeout_ms,
        } => {
            let store = if let Some(url) = url {
                // URL takes precedence when both are configured
                tracing::info!("Connecting to PostgreSQL using connection URL");
                PostgresStore::from_url(url, *max_connections, *statement_timeout_ms).await?
            } else if let (Some(host), Some(database)) = (host.as_ref(), database.as_ref()) {
                PostgresStore::from_params(
                    host,
                    port.unwrap_or(5432),
                    username.as_deref(),
                    password.as_deref(),
                    database,
                    *max_connections,
                    *statement_timeout_ms,
                )
                .await?
            } else {
                return Err(DbError::Config(
                    "postgres configuration requires either a url or host + database".to_string(),
                ));
            };
            Ok(Arc::new(store) as Arc<dyn UserStore>)
        }
    }
}

/// Split an embedded schema into individual executable statements.
pub(crate) fn schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}
