//! 评价 API 路由。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::put,
};
use coursehub_api_types::catalog::{CreateReviewRequest, ReviewResponse};
use coursehub_core::domain::ReviewId;

use super::error::ApiError;
use super::extract::{ApiJson, AuthUser, path_id};
use super::state::AppState;
use crate::repository::review_repository::ReviewRecord;

/// 创建评价 API 路由。
pub fn create_reviews_router() -> Router<Arc<AppState>> {
    Router::new().route("/api/reviews/{id}", put(update_review).delete(delete_review))
}

pub(crate) fn review_response(review: ReviewRecord) -> ReviewResponse {
    ReviewResponse {
        id: review.id.to_string(),
        course_id: review.course_id.to_string(),
        student_id: review.student_id.to_string(),
        username: review.username,
        rating: review.rating.value(),
        comment: review.comment,
        created_at: review.created_at,
    }
}

/// 修改自己的评价。
async fn update_review(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<CreateReviewRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let review_id: ReviewId = path_id("review", &id)?;
    let review = state
        .catalog
        .update_review(&actor, review_id, request)
        .await?;
    Ok(Json(review_response(review)))
}

/// 删除评价（作者或管理员）。
async fn delete_review(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let review_id: ReviewId = path_id("review", &id)?;
    state.catalog.delete_review(&actor, review_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
