//! HS256 access token issuance and validation.

use crate::error::{AuthError, AuthResult};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Claims carried by an access token.
///
/// The caller identity (`user_id`, `email`) is consumed downstream as an
/// opaque identity when stamping audit columns.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// A freshly issued access token.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    /// Expiry, seconds since the Unix epoch.
    pub expires_at: i64,
}

/// Encoder/decoder for access tokens.
///
/// Constructed once at startup from configuration and shared by reference;
/// no process-wide token state.
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtCodec {
    /// Create a codec from the shared HMAC secret and token lifetime.
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a token for the given identity, valid for the configured TTL.
    pub fn issue(&self, user_id: i64, email: &str) -> AuthResult<IssuedToken> {
        let now = OffsetDateTime::now_utc();
        let expires_at = (now + self.ttl).unix_timestamp();
        let claims = Claims {
            user_id,
            email: email.to_string(),
            iat: now.unix_timestamp(),
            exp: expires_at,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InvalidToken(format!("failed to sign token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a token and return its claims.
    ///
    /// Rejects non-HS256 tokens, bad signatures, and expired tokens
    /// (`AuthError::TokenExpired` for the latter).
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            },
        )?;
        Ok(data.claims)
    }
}
