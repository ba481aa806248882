//! Authentication primitives for roster.
//!
//! Access tokens are HS256 JWTs carrying the caller identity; passwords are
//! stored as bcrypt hashes. Both are consumed by the server crate: the token
//! codec in the bearer middleware and login flow, the password helpers in
//! the sign-up and login use-cases.

pub mod error;
pub mod jwt;
pub mod password;

pub use error::{AuthError, AuthResult};
pub use jwt::{Claims, IssuedToken, JwtCodec};
pub use password::{hash_password, validate_password, verify_password};
