//! HTTP request handlers.

pub mod health;
pub mod users;

pub use health::*;
pub use users::*;
