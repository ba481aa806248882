//! Server test utilities.

use axum::http::StatusCode;
use roster_core::config::{AppConfig, DatabaseConfig};
use roster_db::{SqliteStore, UserStore};
use roster_server::{AppState, create_router};
use std::sync::Arc;
use tempfile::TempDir;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server backed by a temporary SQLite database.
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("roster.db");

        let store: Arc<dyn UserStore> = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .expect("Failed to create user store"),
        );

        let mut config = AppConfig::for_testing();
        config.database = DatabaseConfig::Sqlite {
            path: db_path.clone(),
        };

        let state = AppState::new(config, store);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying user store.
    pub fn store(&self) -> Arc<dyn UserStore> {
        self.state.store.clone()
    }
}

/// Make a JSON request against the router and return status + parsed body.
#[allow(dead_code)]
pub async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    auth_token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = auth_token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let request = builder.body(body).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_json: serde_json::Value = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, body_json)
}

/// Sign up a user and return their generated id.
#[allow(dead_code)]
pub async fn sign_up_user(server: &TestServer, email: &str, fullname: &str) -> i64 {
    let body = serde_json::json!({
        "fullname": fullname,
        "phone_number": "0812345678",
        "email": email,
        "password": "a-strong-password",
    });

    let (status, response) = json_request(&server.router, "POST", "/v1/users", Some(body), None).await;
    assert_eq!(status, StatusCode::CREATED, "sign up failed: {response}");
    response["user_id"].as_i64().expect("user_id missing")
}

/// Log a user in and return their access token.
#[allow(dead_code)]
pub async fn login_user(server: &TestServer, email: &str) -> String {
    let body = serde_json::json!({
        "email": email,
        "password": "a-strong-password",
    });

    let (status, response) =
        json_request(&server.router, "POST", "/v1/auth/login", Some(body), None).await;
    assert_eq!(status, StatusCode::OK, "login failed: {response}");
    response["access_token"]
        .as_str()
        .expect("access_token missing")
        .to_string()
}
