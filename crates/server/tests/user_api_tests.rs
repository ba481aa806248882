//! Integration tests for the user API surface.

mod common;

use axum::http::StatusCode;
use common::{TestServer, json_request, login_user, sign_up_user};
use serde_json::json;

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let (status, body) = json_request(&server.router, "GET", "/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// =============================================================================
// Sign-up
// =============================================================================

#[tokio::test]
async fn test_sign_up_returns_created_with_id() {
    let server = TestServer::new().await;

    let user_id = sign_up_user(&server, "jane@example.com", "Jane Doe").await;
    assert!(user_id > 0);
}

#[tokio::test]
async fn test_sign_up_duplicate_email_conflicts() {
    let server = TestServer::new().await;
    sign_up_user(&server, "jane@example.com", "Jane Doe").await;

    let body = json!({
        "fullname": "Other Jane",
        "phone_number": "0812345678",
        "email": "jane@example.com",
        "password": "a-strong-password",
    });

    let (status, response) =
        json_request(&server.router, "POST", "/v1/users", Some(body), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(response["code"], "conflict");
}

#[tokio::test]
async fn test_sign_up_rejects_invalid_payloads() {
    let server = TestServer::new().await;

    // missing '@' in email
    let bad_email = json!({
        "fullname": "Jane",
        "phone_number": "0812345678",
        "email": "nope",
        "password": "a-strong-password",
    });
    let (status, _) = json_request(&server.router, "POST", "/v1/users", Some(bad_email), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // short password
    let bad_password = json!({
        "fullname": "Jane",
        "phone_number": "0812345678",
        "email": "jane@example.com",
        "password": "short",
    });
    let (status, _) =
        json_request(&server.router, "POST", "/v1/users", Some(bad_password), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // malformed JSON body
    let (status, _) = json_request(&server.router, "POST", "/v1/users", Some(json!("[")), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_returns_token() {
    let server = TestServer::new().await;
    sign_up_user(&server, "jane@example.com", "Jane Doe").await;

    let body = json!({"email": "jane@example.com", "password": "a-strong-password"});
    let (status, response) =
        json_request(&server.router, "POST", "/v1/auth/login", Some(body), None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(response["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(response["expired_at"].as_i64().is_some());
}

#[tokio::test]
async fn test_login_wrong_password_unauthorized() {
    let server = TestServer::new().await;
    sign_up_user(&server, "jane@example.com", "Jane Doe").await;

    let body = json!({"email": "jane@example.com", "password": "wrong-password-here"});
    let (status, response) =
        json_request(&server.router, "POST", "/v1/auth/login", Some(body), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["code"], "unauthorized");
}

#[tokio::test]
async fn test_login_unknown_email_unauthorized() {
    let server = TestServer::new().await;

    // Indistinguishable from a wrong password: no account probing.
    let body = json!({"email": "ghost@example.com", "password": "a-strong-password"});
    let (status, _) =
        json_request(&server.router, "POST", "/v1/auth/login", Some(body), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Detail
// =============================================================================

#[tokio::test]
async fn test_detail_requires_auth() {
    let server = TestServer::new().await;

    let (status, _) = json_request(&server.router, "GET", "/v1/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        json_request(&server.router, "GET", "/v1/users/me", None, Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_detail_returns_caller_account() {
    let server = TestServer::new().await;
    let user_id = sign_up_user(&server, "jane@example.com", "Jane Doe").await;
    let token = login_user(&server, "jane@example.com").await;

    let (status, body) =
        json_request(&server.router, "GET", "/v1/users/me", None, Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["email"], "jane@example.com");
    assert_eq!(body["fullname"], "Jane Doe");
    assert_eq!(body["user_type"], "regular_user");
    assert_eq!(body["is_active"], true);
    assert!(body.get("password").is_none());
}

// =============================================================================
// Partial update
// =============================================================================

#[tokio::test]
async fn test_partial_update_changes_only_present_fields() {
    let server = TestServer::new().await;
    sign_up_user(&server, "jane@example.com", "Jane Doe").await;
    let token = login_user(&server, "jane@example.com").await;

    let body = json!({"fullname": "Jane Smith"});
    let (status, _) =
        json_request(&server.router, "PATCH", "/v1/users/me", Some(body), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = json_request(&server.router, "GET", "/v1/users/me", None, Some(&token)).await;
    assert_eq!(detail["fullname"], "Jane Smith");
    // Absent fields round-trip unchanged
    assert_eq!(detail["phone_number"], "0812345678");
    assert_eq!(detail["email"], "jane@example.com");
    assert_eq!(detail["user_type"], "regular_user");
}

#[tokio::test]
async fn test_partial_update_email_conflict() {
    let server = TestServer::new().await;
    sign_up_user(&server, "jane@example.com", "Jane Doe").await;
    sign_up_user(&server, "john@example.com", "John Doe").await;
    let token = login_user(&server, "jane@example.com").await;

    let body = json!({"email": "john@example.com"});
    let (status, response) =
        json_request(&server.router, "PATCH", "/v1/users/me", Some(body), Some(&token)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(response["code"], "conflict");
}

#[tokio::test]
async fn test_partial_update_rejects_invalid_user_type() {
    let server = TestServer::new().await;
    sign_up_user(&server, "jane@example.com", "Jane Doe").await;
    let token = login_user(&server, "jane@example.com").await;

    let body = json!({"user_type": "admin_user"});
    let (status, _) =
        json_request(&server.router, "PATCH", "/v1/users/me", Some(body), Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_partial_update_allows_user_type_upgrade() {
    let server = TestServer::new().await;
    sign_up_user(&server, "jane@example.com", "Jane Doe").await;
    let token = login_user(&server, "jane@example.com").await;

    let body = json!({"user_type": "premium_user"});
    let (status, _) =
        json_request(&server.router, "PATCH", "/v1/users/me", Some(body), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = json_request(&server.router, "GET", "/v1/users/me", None, Some(&token)).await;
    assert_eq!(detail["user_type"], "premium_user");
}

// =============================================================================
// Status transition
// =============================================================================

#[tokio::test]
async fn test_status_transition_flips_active_flag() {
    let server = TestServer::new().await;
    sign_up_user(&server, "jane@example.com", "Jane Doe").await;
    let token = login_user(&server, "jane@example.com").await;

    let body = json!({"status": false});
    let (status, _) = json_request(
        &server.router,
        "PUT",
        "/v1/users/me/status",
        Some(body),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = json_request(&server.router, "GET", "/v1/users/me", None, Some(&token)).await;
    assert_eq!(detail["is_active"], false);
}

#[tokio::test]
async fn test_status_transition_requires_auth() {
    let server = TestServer::new().await;

    let body = json!({"status": false});
    let (status, _) =
        json_request(&server.router, "PUT", "/v1/users/me/status", Some(body), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
