mod common;

use axum::http::{Method, StatusCode};
use common::{PASSWORD, spawn_app};
use serde_json::json;

#[tokio::test]
async fn test_register_login_and_me() {
    let app = spawn_app().await;
    let token = app.user("alice", "student").await;

    let (status, me) = app.get("/api/users/me", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice");
    assert_eq!(me["email"], "alice@example.com");
    assert_eq!(me["role"], "student");
}

#[tokio::test]
async fn test_login_accepts_email() {
    let app = spawn_app().await;
    app.user("alice", "student").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({ "username": "alice@example.com", "password": PASSWORD })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    app.user("alice", "student").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({ "username": "alice", "password": "not the password" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = spawn_app().await;
    app.user("alice", "student").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({
                "username": "alice",
                "email": "other@example.com",
                "password": PASSWORD,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_admin_role_cannot_be_self_assigned() {
    let app = spawn_app().await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({
                "username": "mallory",
                "email": "mallory@example.com",
                "password": PASSWORD,
                "role": "admin",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = spawn_app().await;

    let (status, _) = app.send(Method::GET, "/api/users/me", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_cannot_be_used_as_access_token() {
    let app = spawn_app().await;
    app.user("alice", "student").await;
    let (_, tokens) = app
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({ "username": "alice", "password": PASSWORD })),
        )
        .await;
    let refresh = tokens["refresh_token"].as_str().expect("refresh token");

    let (status, _) = app.get("/api/users/me", refresh).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, renewed) = app
        .send(
            Method::POST,
            "/api/users/refresh",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = renewed["access_token"].as_str().expect("access token");
    let (status, _) = app.get("/api/users/me", access).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;

    let (status, body) = app.send(Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
