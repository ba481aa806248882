//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use roster_auth::AuthError;
use roster_db::DbError;
use serde::Serialize;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("store error: {0}")]
    Db(#[from] DbError),

    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("core error: {0}")]
    Core(#[from] roster_core::Error),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal_error",
            Self::Db(e) => match e {
                DbError::NotFound(_) => "not_found",
                DbError::AlreadyExists(_) => "conflict",
                DbError::RowLocked(_) => "conflict",
                _ => "store_error",
            },
            Self::Auth(e) => match e {
                AuthError::InvalidToken(_) | AuthError::TokenExpired => "unauthorized",
                AuthError::WeakPassword(_) => "bad_request",
                AuthError::Hashing(_) => "auth_error",
            },
            Self::Core(_) => "bad_request",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Db(e) => match e {
                DbError::NotFound(_) => StatusCode::NOT_FOUND,
                DbError::AlreadyExists(_) => StatusCode::CONFLICT,
                // A failed NOWAIT lock acquisition means a concurrent writer
                // holds the row; surfaced as a retryable conflict.
                DbError::RowLocked(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(e) => match e {
                AuthError::InvalidToken(_) | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Core(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
