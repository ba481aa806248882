//! Route configuration.

use crate::auth::auth_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (intentionally unauthenticated for load balancers/probes)
        .route("/v1/health", get(handlers::health_check))
        // Account registration and login
        .route("/v1/users", post(handlers::sign_up))
        .route("/v1/auth/login", post(handlers::login))
        // Authenticated account operations; the target is always the caller
        .route(
            "/v1/users/me",
            get(handlers::user_detail).patch(handlers::update_user),
        )
        .route("/v1/users/me/status", put(handlers::update_user_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
