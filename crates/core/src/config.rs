//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable per-request tracing spans.
    #[serde(default)]
    pub enable_tracing: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            enable_tracing: false,
        }
    }
}

/// Database backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseConfig {
    /// Local SQLite database (testing and single-node deployments).
    Sqlite {
        /// Path to the database file.
        path: PathBuf,
    },
    /// PostgreSQL database.
    Postgres {
        /// Full connection URL. Takes precedence over individual fields.
        url: Option<String>,
        /// Host name (used when `url` is not set).
        host: Option<String>,
        /// Port (default 5432).
        port: Option<u16>,
        /// Username. Falls back to the driver default if not set.
        username: Option<String>,
        /// Password. Prefer environment variables over config files.
        password: Option<String>,
        /// Database name (used when `url` is not set).
        database: Option<String>,
        /// Maximum pooled connections.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
        /// Per-statement timeout in milliseconds, if any.
        statement_timeout_ms: Option<u64>,
    },
}

fn default_max_connections() -> u32 {
    10
}

/// Authentication configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing access tokens.
    pub jwt_secret: String,
    /// Access token lifetime in minutes.
    #[serde(default = "default_token_ttl_mins")]
    pub token_ttl_mins: u64,
    /// Bcrypt cost factor override. Defaults to the library's recommended cost.
    pub bcrypt_cost: Option<u32>,
}

fn default_token_ttl_mins() -> u64 {
    15
}

impl AuthConfig {
    /// Access token lifetime as a Duration.
    pub fn token_ttl(&self) -> Duration {
        // Saturate at i64::MAX to prevent overflow wrapping to negative
        let mins = i64::try_from(self.token_ttl_mins).unwrap_or(i64::MAX);
        Duration::minutes(mins)
    }

    /// Create a test configuration with a fixed secret and cheap hashing.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            jwt_secret: "test-jwt-secret".to_string(),
            token_ttl_mins: default_token_ttl_mins(),
            bcrypt_cost: Some(4),
        }
    }
}

/// Top-level application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Create a test configuration backed by an in-memory SQLite database.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::Sqlite {
                path: PathBuf::from(":memory:"),
            },
            auth: AuthConfig::for_testing(),
        }
    }
}
