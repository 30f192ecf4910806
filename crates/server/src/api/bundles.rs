//! 课程包 API 路由。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use coursehub_api_types::catalog::{BundleResponse, CreateBundleRequest};
use coursehub_core::domain::BundleId;

use super::error::ApiError;
use super::extract::{ApiJson, AuthUser, path_id};
use super::state::AppState;
use crate::repository::course_repository::BundleRecord;

/// 创建课程包 API 路由。
pub fn create_bundles_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/bundle", get(list_bundles).post(create_bundle))
        .route("/api/bundle/{id}", get(get_bundle).delete(delete_bundle))
}

fn bundle_response(bundle: BundleRecord) -> BundleResponse {
    BundleResponse {
        id: bundle.id.to_string(),
        educator_id: bundle.educator_id.to_string(),
        title: bundle.title,
        description: bundle.description,
        price_cents: bundle.price.cents(),
        course_ids: bundle.course_ids.iter().map(ToString::to_string).collect(),
        created_at: bundle.created_at,
    }
}

async fn list_bundles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BundleResponse>>, ApiError> {
    let bundles = state.catalog.list_bundles().await?;
    Ok(Json(bundles.into_iter().map(bundle_response).collect()))
}

/// 将讲师自己的若干课程打包定价。
async fn create_bundle(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    ApiJson(request): ApiJson<CreateBundleRequest>,
) -> Result<(StatusCode, Json<BundleResponse>), ApiError> {
    let bundle = state.catalog.create_bundle(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(bundle_response(bundle))))
}

async fn get_bundle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BundleResponse>, ApiError> {
    let bundle_id: BundleId = path_id("bundle", &id)?;
    Ok(Json(bundle_response(state.catalog.get_bundle(bundle_id).await?)))
}

async fn delete_bundle(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let bundle_id: BundleId = path_id("bundle", &id)?;
    state.catalog.delete_bundle(&actor, bundle_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
