//! User account handlers.

use crate::auth::require_auth;
use crate::dto::{
    LoginRequest, LoginResponse, SignUpRequest, SignUpResponse, UpdateStatusRequest,
    UpdateUserRequest, UserDetailResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use serde::de::DeserializeOwned;

/// Maximum request body size for account endpoints.
const MAX_BODY_SIZE: usize = 64 * 1024;

/// Read and deserialize a JSON request body, mapping failures to 400s so
/// every endpoint reports malformed input through the same error envelope.
async fn parse_json_body<T: DeserializeOwned>(req: Request) -> ApiResult<T> {
    let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))
}

/// POST /v1/users — register a new account.
pub async fn sign_up(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<SignUpResponse>)> {
    let body: SignUpRequest = parse_json_body(req).await?;
    body.validate()?;

    let response = state.users.sign_up(body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /v1/auth/login — exchange credentials for an access token.
pub async fn login(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<Json<LoginResponse>> {
    let body: LoginRequest = parse_json_body(req).await?;
    body.validate()?;

    let response = state.users.login(body).await?;
    Ok(Json(response))
}

/// GET /v1/users/me — the caller's account detail.
pub async fn user_detail(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<Json<UserDetailResponse>> {
    let auth = require_auth(&req)?.clone();

    let response = state.users.detail(auth.user_id).await?;
    Ok(Json(response))
}

/// PATCH /v1/users/me — guarded partial update of the caller's account.
pub async fn update_user(State(state): State<AppState>, req: Request) -> ApiResult<StatusCode> {
    let auth = require_auth(&req)?.clone();

    let body: UpdateUserRequest = parse_json_body(req).await?;
    body.validate()?;

    state.users.partial_update(&auth, body).await?;
    Ok(StatusCode::OK)
}

/// PUT /v1/users/me/status — flip the caller's active flag.
pub async fn update_user_status(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<StatusCode> {
    let auth = require_auth(&req)?.clone();

    let body: UpdateStatusRequest = parse_json_body(req).await?;

    state.users.transition_status(&auth, body).await?;
    Ok(StatusCode::OK)
}
