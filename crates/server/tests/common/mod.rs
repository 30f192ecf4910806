#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use coursehub_server::api::{AppState, create_router};
use coursehub_server::clock::ManualClock;
use coursehub_server::config::ServerConfig;
use coursehub_server::db::init_pool_and_migrate;
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const PASSWORD: &str = "correct horse battery";

pub struct TestApp {
    pub router: Router,
    pub clock: ManualClock,
    pub state: Arc<AppState>,
    pub db: DatabaseConnection,
}

pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .expect("valid start time")
}

pub async fn spawn_app() -> TestApp {
    let db = init_pool_and_migrate("sqlite::memory:")
        .await
        .expect("in-memory database should migrate");
    let config = ServerConfig {
        jwt_secret: "test-secret".to_string(),
        ..ServerConfig::default()
    };
    let clock = ManualClock::new(start_time());
    let state = Arc::new(AppState::new(db.clone(), config, Arc::new(clock.clone())));

    TestApp {
        router: create_router(state.clone()),
        clock,
        state,
        db,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should be readable")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body should be json")
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn login(&self, username: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/users/login",
                None,
                Some(json!({ "username": username, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"]
            .as_str()
            .expect("access token in response")
            .to_string()
    }

    /// Registers a user with `role` and returns an access token.
    pub async fn user(&self, username: &str, role: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/users/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": PASSWORD,
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        self.login(username).await
    }

    pub async fn admin(&self) -> String {
        self.state
            .auth
            .ensure_admin("admin", "admin@example.com", PASSWORD)
            .await
            .expect("admin account should be created");
        self.login("admin").await
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Creates and publishes a test with one mcq (4 marks, -1) and one
    /// numerical question (2 marks). Returns the test id and question ids.
    pub async fn published_test(
        &self,
        educator: &str,
        duration_minutes: i32,
        allow_retake: bool,
    ) -> (String, String, String) {
        let (status, test) = self
            .post(
                "/api/tests",
                educator,
                json!({
                    "name": "Arithmetic",
                    "subject": "math",
                    "duration_minutes": duration_minutes,
                    "allow_retake": allow_retake,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create test failed: {test}");
        let test_id = test["id"].as_str().expect("test id").to_string();

        let (status, mcq) = self
            .post(
                &format!("/api/tests/{test_id}/questions"),
                educator,
                json!({
                    "question_text": "2 + 2?",
                    "question_type": "mcq",
                    "options": ["3", "4", "5"],
                    "correct_answers": ["4"],
                    "marks": 4.0,
                    "negative_marks": 1.0,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add mcq failed: {mcq}");

        let (status, numerical) = self
            .post(
                &format!("/api/tests/{test_id}/questions"),
                educator,
                json!({
                    "question_text": "10 / 4?",
                    "question_type": "numerical",
                    "correct_answers": ["2.5"],
                    "marks": 2.0,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add numerical failed: {numerical}");

        let (status, body) = self
            .put(
                &format!("/api/tests/{test_id}/status"),
                educator,
                json!({ "status": "published" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "publish failed: {body}");

        (
            test_id,
            mcq["id"].as_str().expect("mcq id").to_string(),
            numerical["id"].as_str().expect("numerical id").to_string(),
        )
    }
}
