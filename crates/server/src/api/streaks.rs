//! 连续学习与徽章 API 路由。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use coursehub_api_types::MessageResponse;
use coursehub_api_types::streak::{
    ActivityResponse, BadgeResponse, CreateBadgeRequest, EarnedBadgeResponse, StreakResponse,
};
use coursehub_core::domain::{BadgeId, Streak};

use super::error::ApiError;
use super::extract::{ApiJson, AuthUser, path_id};
use super::state::AppState;
use crate::repository::streak_repository::{BadgeRecord, EarnedBadgeRecord};

/// 创建连续学习 API 路由。
pub fn create_streaks_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/streaks", get(get_streak))
        .route("/api/streaks/activity", post(record_activity))
        .route("/api/streaks/badges", get(list_badges).post(create_badge))
        .route("/api/streaks/badges/mine", get(my_badges))
        .route("/api/streaks/badges/seen", post(mark_seen))
        .route("/api/streaks/badges/{id}", delete(delete_badge))
}

fn streak_response(streak: Streak) -> StreakResponse {
    StreakResponse {
        current_streak: streak.current_streak,
        longest_streak: streak.longest_streak,
        last_activity_date: streak.last_activity_date,
        total_active_days: streak.total_active_days,
        freeze_used: streak.freeze_used,
    }
}

fn badge_response(badge: BadgeRecord) -> BadgeResponse {
    BadgeResponse {
        id: badge.id.to_string(),
        name: badge.name,
        description: badge.description,
        metric: badge.metric.as_str().to_string(),
        milestone_days: badge.milestone_days,
    }
}

fn earned_response(earned: EarnedBadgeRecord) -> EarnedBadgeResponse {
    EarnedBadgeResponse {
        badge: badge_response(earned.badge),
        earned_at: earned.earned_at,
        is_new: earned.is_new,
    }
}

/// 当前用户的连续学习统计。
async fn get_streak(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<Json<StreakResponse>, ApiError> {
    Ok(Json(streak_response(state.streaks.streak(actor.id).await?)))
}

/// 记录今日学习并发放达成的徽章。
async fn record_activity(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<Json<ActivityResponse>, ApiError> {
    let result = state.streaks.record_activity(actor.id).await?;
    Ok(Json(ActivityResponse {
        outcome: result.outcome.as_str().to_string(),
        streak: streak_response(result.streak),
        new_badges: result.new_badges.into_iter().map(earned_response).collect(),
    }))
}

/// 列出全部徽章定义。
async fn list_badges(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BadgeResponse>>, ApiError> {
    let badges = state.streaks.list_badges().await?;
    Ok(Json(badges.into_iter().map(badge_response).collect()))
}

/// 新增徽章（管理员）。
async fn create_badge(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    ApiJson(request): ApiJson<CreateBadgeRequest>,
) -> Result<(StatusCode, Json<BadgeResponse>), ApiError> {
    let badge = state.streaks.create_badge(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(badge_response(badge))))
}

/// 删除徽章（管理员）。
async fn delete_badge(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let badge_id: BadgeId = path_id("badge", &id)?;
    state.streaks.delete_badge(&actor, badge_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 当前用户已获得的徽章。
async fn my_badges(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Vec<EarnedBadgeResponse>>, ApiError> {
    let badges = state.streaks.user_badges(actor.id).await?;
    Ok(Json(badges.into_iter().map(earned_response).collect()))
}

/// 将新徽章标记为已查看。
async fn mark_seen(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let count = state.streaks.mark_badges_seen(actor.id).await?;
    Ok(Json(MessageResponse::new(format!(
        "{count} badges marked as seen"
    ))))
}
