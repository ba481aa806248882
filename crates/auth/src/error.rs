//! Authentication error types.

use thiserror::Error;

/// Authentication and credential errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    TokenExpired,

    #[error("hashing error: {0}")]
    Hashing(String),

    #[error("weak password: {0}")]
    WeakPassword(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = std::result::Result<T, AuthError>;
