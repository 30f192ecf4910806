//! 请求提取器。
//!
//! 访问令牌可来自 `Authorization: Bearer` 请求头或 `access_token` Cookie。

use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::state::AppState;
use crate::service::auth_service::AuthenticatedUser;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?;
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == ACCESS_TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn access_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_token(headers))
}

/// 已登录的调用方；缺少或无效的令牌返回 401。
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub AuthenticatedUser);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = access_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("missing access token"))?;
        let user = state.auth.authenticate(&token)?;
        Ok(AuthUser(user))
    }
}

/// 可选的调用方，用于公开但对作者展示更多内容的接口。
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<AuthenticatedUser>);

impl FromRequestParts<Arc<AppState>> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = access_token(&parts.headers)
            .and_then(|token| state.auth.authenticate(&token).ok());
        Ok(MaybeAuthUser(user))
    }
}

/// 以统一错误格式拒绝无效请求体的 JSON 提取器。
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// 解析路径中的 ID；格式错误视为资源不存在。
pub fn path_id<T: FromStr>(what: &str, raw: &str) -> Result<T, ApiError> {
    T::from_str(raw).map_err(|_| ApiError::not_found(what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("access_token=xyz"));

        assert_eq!(access_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn token_is_read_from_cookie_list() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=xyz; lang=en"),
        );

        assert_eq!(access_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn missing_or_empty_tokens_are_ignored() {
        let mut headers = HeaderMap::new();
        assert_eq!(access_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer  "));
        headers.insert(header::COOKIE, HeaderValue::from_static("access_token="));
        assert_eq!(access_token(&headers), None);
    }
}
