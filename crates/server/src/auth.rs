//! Authentication middleware and request identity.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

/// Maximum length for trace IDs.
/// Longer trace IDs are truncated to prevent log bloat and potential log injection.
const MAX_TRACE_ID_LEN: usize = 128;

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a trace ID from a client-provided value.
    /// The value is sanitized: truncated to MAX_TRACE_ID_LEN characters and
    /// non-printable characters removed.
    pub fn from_client(value: &str) -> Self {
        // Limit by character count, not byte count, to safely handle
        // multi-byte UTF-8; then filter to printable ASCII for log safety.
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();

        if sanitized.is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    /// Get the trace ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated caller, resolved from a bearer access token.
///
/// `email` doubles as the opaque identity stamped into audit columns.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub email: String,
}

/// Authentication middleware.
///
/// Attaches a [`TraceId`] to every request. When an `Authorization` header is
/// present it must be a valid bearer access token; the resolved
/// [`AuthenticatedUser`] is inserted into request extensions for handlers to
/// pick up via [`require_auth`]. Requests without the header pass through
/// unauthenticated so public endpoints (sign-up, login, health) keep working.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let trace_id = req
        .headers()
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_default();
    let trace_id_str = trace_id.as_str().to_string();
    req.extensions_mut().insert(trace_id);

    if let Some(header) = req.headers().get(AUTHORIZATION) {
        let value = header
            .to_str()
            .map_err(|_| ApiError::Unauthorized("invalid authorization header".to_string()))?;
        let token = value.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized("authorization header must use the Bearer scheme".to_string())
        })?;

        // Invalid or expired tokens map to 401 via the error taxonomy.
        let claims = state.jwt.verify(token)?;

        req.extensions_mut().insert(AuthenticatedUser {
            user_id: claims.user_id,
            email: claims.email,
        });
    }

    // Run the request within a tracing span that includes the trace ID
    let response = next
        .run(req)
        .instrument(tracing::info_span!("request", trace_id = %trace_id_str))
        .await;

    Ok(response)
}

/// Require authentication (a valid bearer token must have been presented).
pub fn require_auth(req: &Request) -> ApiResult<&AuthenticatedUser> {
    req.extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))
}
