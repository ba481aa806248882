//! Core domain types and shared logic for the roster account service.
//!
//! This crate defines the canonical data model used across all other crates:
//! - User type classification and validation limits
//! - Application configuration
//! - Core domain errors

pub mod config;
pub mod error;
pub mod user;

pub use config::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig};
pub use error::{Error, Result};
pub use user::UserType;

/// Maximum accepted length for a user's full name.
pub const MAX_FULLNAME_LEN: usize = 50;

/// Maximum accepted length for a phone number.
pub const MAX_PHONE_NUMBER_LEN: usize = 13;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Maximum accepted password length (bcrypt truncates beyond 72 bytes).
pub const MAX_PASSWORD_LEN: usize = 72;
