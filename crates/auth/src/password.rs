//! Password hashing and verification.

use crate::error::{AuthError, AuthResult};
use bcrypt::{DEFAULT_COST, hash, verify};
use roster_core::{MAX_PASSWORD_LEN, MIN_PASSWORD_LEN};

/// Hash a password with bcrypt.
///
/// Runs on the blocking thread pool so the CPU-bound work does not stall the
/// async runtime. `cost` defaults to the library's recommended cost; tests
/// pass a low cost to stay fast.
pub async fn hash_password(password: &str, cost: Option<u32>) -> AuthResult<String> {
    let password = password.to_string();
    let cost = cost.unwrap_or(DEFAULT_COST);

    tokio::task::spawn_blocking(move || {
        hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("task join error: {e}")))?
}

/// Verify a password against a bcrypt hash.
///
/// `Ok(true)` on match, `Ok(false)` on mismatch, `Err` on a malformed hash.
pub async fn verify_password(password: &str, hashed: &str) -> AuthResult<bool> {
    let password = password.to_string();
    let hashed = hashed.to_string();

    tokio::task::spawn_blocking(move || {
        verify(password, &hashed).map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("task join error: {e}")))?
}

/// Validate that a password meets the length requirements.
///
/// Bcrypt ignores bytes past 72, so overlong passwords are rejected rather
/// than silently truncated.
pub fn validate_password(password: &str) -> AuthResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if password.len() > MAX_PASSWORD_LEN {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }

    Ok(())
}
