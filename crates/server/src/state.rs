//! Application state shared across handlers.

use crate::usecase::{UserService, UserUsecase};
use roster_auth::JwtCodec;
use roster_core::config::AppConfig;
use roster_db::UserStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// User store.
    pub store: Arc<dyn UserStore>,
    /// Access token codec.
    pub jwt: Arc<JwtCodec>,
    /// User use-cases.
    pub users: Arc<dyn UserUsecase>,
}

impl AppState {
    /// Create a new application state, wiring the production use-case
    /// implementation over the given store.
    pub fn new(config: AppConfig, store: Arc<dyn UserStore>) -> Self {
        let jwt = Arc::new(JwtCodec::new(
            &config.auth.jwt_secret,
            config.auth.token_ttl(),
        ));
        let users = Arc::new(UserService::new(
            store.clone(),
            jwt.clone(),
            config.auth.bcrypt_cost,
        ));

        Self {
            config: Arc::new(config),
            store,
            jwt,
            users,
        }
    }
}
