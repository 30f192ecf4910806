//! 用户 API 路由。
//!
//! 注册、登录、刷新令牌与用户信息。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use coursehub_api_types::MessageResponse;
use coursehub_api_types::auth::{
    LoginRequest, RefreshRequest, RegisterRequest, TokenResponse, UserProfileResponse,
    UserResponse,
};
use coursehub_core::domain::UserId;

use super::error::ApiError;
use super::extract::{ACCESS_TOKEN_COOKIE, ApiJson, AuthUser, path_id};
use super::state::AppState;
use crate::repository::user_repository::UserRecord;
use crate::service::auth_service::{Registration, TokenPair};

/// 创建用户 API 路由。
pub fn create_users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
        .route("/api/users/refresh", post(refresh))
        .route("/api/users/logout", post(logout))
        .route("/api/users/me", get(me))
        .route("/api/users/{id}", get(get_user))
}

fn user_response(user: UserRecord) -> UserResponse {
    UserResponse {
        id: user.id.to_string(),
        username: user.username,
        email: user.email,
        role: user.role.as_str().to_string(),
        created_at: user.created_at,
    }
}

/// 返回令牌，同时写入 HttpOnly 的访问令牌 Cookie。
fn token_response(pair: TokenPair) -> Response {
    let cookie = format!(
        "{ACCESS_TOKEN_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        pair.access_token, pair.expires_in
    );
    let body = Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: pair.expires_in,
    });

    match HeaderValue::from_str(&cookie) {
        Ok(value) => ([(header::SET_COOKIE, value)], body).into_response(),
        Err(_) => body.into_response(),
    }
}

/// 注册新用户。
async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state
        .auth
        .register(Registration {
            username: request.username,
            email: request.email,
            password: request.password,
            role: request.role,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user_response(user))))
}

/// 使用用户名或邮箱登录。
async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let pair = state.auth.login(&request.username, &request.password).await?;
    Ok(token_response(pair))
}

/// 使用刷新令牌换取新的令牌对。
async fn refresh(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<Response, ApiError> {
    let pair = state.auth.refresh(&request.refresh_token).await?;
    Ok(token_response(pair))
}

/// 清除访问令牌 Cookie。
async fn logout() -> impl IntoResponse {
    let cookie = format!("{ACCESS_TOKEN_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    (
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse::new("logged out")),
    )
}

/// 获取当前用户。
async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.auth.find_user(actor.id).await?;
    Ok(Json(user_response(user)))
}

/// 获取其他用户的公开信息。
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserProfileResponse>, ApiError> {
    let user_id: UserId = path_id("user", &id)?;
    let user = state.auth.find_user(user_id).await?;
    Ok(Json(UserProfileResponse {
        id: user.id.to_string(),
        username: user.username,
        role: user.role.as_str().to_string(),
    }))
}
