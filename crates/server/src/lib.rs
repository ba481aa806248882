//! HTTP API server for the roster account service.
//!
//! This crate provides the HTTP control plane:
//! - Account registration and login
//! - Authenticated detail lookup, partial update, and status transition
//! - Bearer-token authentication middleware
//! - Error-to-status mapping for the API taxonomy

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod usecase;

pub use auth::{AuthenticatedUser, TraceId};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
pub use usecase::{UserService, UserUsecase};
