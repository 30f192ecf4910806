//! 课程 API 路由。
//!
//! 课程目录、课程评价、公告与 FAQ。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use coursehub_api_types::MessageResponse;
use coursehub_api_types::catalog::{
    AnnouncementResponse, CourseResponse, CourseReviewsResponse, CreateAnnouncementRequest,
    CreateCourseRequest, CreateFaqRequest, CreateReviewRequest, FaqResponse, ReviewResponse,
    UpdateCourseRequest,
};
use coursehub_core::domain::{AnnouncementId, CourseId, FaqId, RatingSummary};

use super::error::ApiError;
use super::extract::{ApiJson, AuthUser, MaybeAuthUser, path_id};
use super::reviews::review_response;
use super::state::AppState;
use crate::repository::content_repository::{AnnouncementRecord, FaqRecord};
use crate::repository::course_repository::CourseRecord;

/// 创建课程 API 路由。
pub fn create_courses_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/courses", get(list_courses).post(create_course))
        .route("/api/courses/mine", get(list_own_courses))
        .route("/api/courses/enrolled", get(list_enrolled_courses))
        .route(
            "/api/courses/{id}",
            get(get_course).patch(update_course).delete(delete_course),
        )
        .route(
            "/api/courses/{id}/reviews",
            get(list_reviews).post(create_review),
        )
        .route(
            "/api/courses/{id}/announcements",
            get(list_announcements).post(create_announcement),
        )
        .route(
            "/api/courses/{id}/announcements/{announcement_id}",
            delete(delete_announcement),
        )
        .route("/api/courses/{id}/faqs", get(list_faqs).post(create_faq))
        .route("/api/courses/{id}/faqs/{faq_id}", delete(delete_faq))
}

pub(crate) fn course_response(course: CourseRecord, summary: RatingSummary) -> CourseResponse {
    CourseResponse {
        id: course.id.to_string(),
        educator_id: course.educator_id.to_string(),
        title: course.title,
        description: course.description,
        price_cents: course.price.cents(),
        published: course.published,
        average_rating: summary.average,
        review_count: summary.count,
        created_at: course.created_at,
    }
}

fn course_list(courses: Vec<(CourseRecord, RatingSummary)>) -> Json<Vec<CourseResponse>> {
    Json(
        courses
            .into_iter()
            .map(|(course, summary)| course_response(course, summary))
            .collect(),
    )
}

fn announcement_response(announcement: AnnouncementRecord) -> AnnouncementResponse {
    AnnouncementResponse {
        id: announcement.id.to_string(),
        course_id: announcement.course_id.to_string(),
        title: announcement.title,
        body: announcement.body,
        created_at: announcement.created_at,
    }
}

fn faq_response(faq: FaqRecord) -> FaqResponse {
    FaqResponse {
        id: faq.id.to_string(),
        course_id: faq.course_id.to_string(),
        question: faq.question,
        answer: faq.answer,
        position: faq.position,
    }
}

/// 列出已发布的课程。
async fn list_courses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    Ok(course_list(state.catalog.list_courses().await?))
}

/// 列出当前讲师的全部课程（含未发布）。
async fn list_own_courses(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    Ok(course_list(state.catalog.list_own_courses(&actor).await?))
}

/// 列出当前用户已购买的课程。
async fn list_enrolled_courses(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    Ok(course_list(state.catalog.list_enrolled_courses(&actor).await?))
}

/// 创建课程。
async fn create_course(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    ApiJson(request): ApiJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    let course = state.catalog.create_course(&actor, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(course_response(course, RatingSummary::default())),
    ))
}

/// 获取课程详情及评分汇总。
async fn get_course(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<String>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course_id: CourseId = path_id("course", &id)?;
    let (course, summary) = state.catalog.get_course(viewer.as_ref(), course_id).await?;
    Ok(Json(course_response(course, summary)))
}

/// 更新课程。
async fn update_course(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course_id: CourseId = path_id("course", &id)?;
    let (course, summary) = state
        .catalog
        .update_course(&actor, course_id, request)
        .await?;
    Ok(Json(course_response(course, summary)))
}

/// 删除课程。
async fn delete_course(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let course_id: CourseId = path_id("course", &id)?;
    state.catalog.delete_course(&actor, course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 列出课程评价及平均分。
async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CourseReviewsResponse>, ApiError> {
    let course_id: CourseId = path_id("course", &id)?;
    let (summary, reviews) = state.catalog.list_reviews(course_id).await?;
    Ok(Json(CourseReviewsResponse {
        average_rating: summary.average,
        review_count: summary.count,
        reviews: reviews.into_iter().map(review_response).collect(),
    }))
}

/// 发表评价（需已购买课程）。
async fn create_review(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    let course_id: CourseId = path_id("course", &id)?;
    let review = state
        .catalog
        .create_review(&actor, course_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(review_response(review))))
}

/// 列出课程公告。
async fn list_announcements(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AnnouncementResponse>>, ApiError> {
    let course_id: CourseId = path_id("course", &id)?;
    let announcements = state.catalog.list_announcements(course_id).await?;
    Ok(Json(
        announcements
            .into_iter()
            .map(announcement_response)
            .collect(),
    ))
}

/// 发布课程公告。
async fn create_announcement(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<AnnouncementResponse>), ApiError> {
    let course_id: CourseId = path_id("course", &id)?;
    let announcement = state
        .catalog
        .create_announcement(&actor, course_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(announcement_response(announcement))))
}

/// 删除课程公告。
async fn delete_announcement(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path((id, announcement_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let course_id: CourseId = path_id("course", &id)?;
    let announcement_id: AnnouncementId = path_id("announcement", &announcement_id)?;
    state
        .catalog
        .delete_announcement(&actor, course_id, announcement_id)
        .await?;
    Ok(Json(MessageResponse::new("announcement deleted")))
}

/// 列出课程 FAQ。
async fn list_faqs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<FaqResponse>>, ApiError> {
    let course_id: CourseId = path_id("course", &id)?;
    let faqs = state.catalog.list_faqs(course_id).await?;
    Ok(Json(faqs.into_iter().map(faq_response).collect()))
}

/// 新增 FAQ 条目。
async fn create_faq(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<CreateFaqRequest>,
) -> Result<(StatusCode, Json<FaqResponse>), ApiError> {
    let course_id: CourseId = path_id("course", &id)?;
    let faq = state.catalog.create_faq(&actor, course_id, request).await?;
    Ok((StatusCode::CREATED, Json(faq_response(faq))))
}

/// 删除 FAQ 条目。
async fn delete_faq(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path((id, faq_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let course_id: CourseId = path_id("course", &id)?;
    let faq_id: FaqId = path_id("faq", &faq_id)?;
    state.catalog.delete_faq(&actor, course_id, faq_id).await?;
    Ok(Json(MessageResponse::new("faq deleted")))
}
