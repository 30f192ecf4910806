//! 测试编写 API 路由。
//!
//! 讲师创建测试、编辑题目并管理发布状态；排行榜也挂在测试下。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    routing::{get, post, put},
};
use coursehub_api_types::exam::{
    CreateTestRequest, LeaderboardEntryResponse, LeaderboardResponse, QuestionRequest,
    QuestionResponse, TestDetailResponse, TestResponse, UpdateTestRequest,
    UpdateTestStatusRequest,
};
use coursehub_core::domain::{QuestionId, TestId, time_taken_minutes};
use serde::Deserialize;

use super::error::ApiError;
use super::extract::{ApiJson, AuthUser, path_id};
use super::state::AppState;
use crate::repository::test_repository::{QuestionRecord, TestRecord};

/// 创建测试 API 路由。
pub fn create_tests_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tests", get(list_tests).post(create_test))
        .route("/api/tests/mine", get(list_own_tests))
        .route(
            "/api/tests/{id}",
            get(get_test).patch(update_test).delete(delete_test),
        )
        .route("/api/tests/{id}/status", put(change_status))
        .route("/api/tests/{id}/questions", post(add_question))
        .route(
            "/api/tests/{id}/questions/{question_id}",
            put(update_question).delete(delete_question),
        )
        .route("/api/tests/{id}/leaderboard", get(leaderboard))
}

pub(crate) fn test_response(test: TestRecord) -> TestResponse {
    TestResponse {
        id: test.id.to_string(),
        educator_id: test.educator_id.to_string(),
        name: test.name,
        subject: test.subject,
        duration_minutes: test.duration_minutes,
        total_marks: test.total_marks,
        num_questions: test.num_questions,
        status: test.status.as_str().to_string(),
        allow_retake: test.allow_retake,
        created_at: test.created_at,
    }
}

/// `reveal_answers` 为假时不返回正确答案。
pub(crate) fn question_response(
    question: QuestionRecord,
    reveal_answers: bool,
) -> QuestionResponse {
    let key = question.key;
    QuestionResponse {
        id: question.id.to_string(),
        position: question.position,
        question_text: question.question_text,
        question_type: key.kind.as_str().to_string(),
        options: key.options,
        correct_answers: reveal_answers.then_some(key.correct_answers),
        marks: key.marks,
        negative_marks: key.negative_marks,
    }
}

/// 列出已发布的测试。
async fn list_tests(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TestResponse>>, ApiError> {
    let tests = state.tests.list_tests().await?;
    Ok(Json(tests.into_iter().map(test_response).collect()))
}

/// 列出当前讲师的全部测试。
async fn list_own_tests(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Vec<TestResponse>>, ApiError> {
    let tests = state.tests.list_own_tests(&actor).await?;
    Ok(Json(tests.into_iter().map(test_response).collect()))
}

/// 创建草稿测试。
async fn create_test(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    ApiJson(request): ApiJson<CreateTestRequest>,
) -> Result<(StatusCode, Json<TestResponse>), ApiError> {
    let test = state.tests.create_test(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(test_response(test))))
}

/// 获取测试及题目；只有作者能看到答案。
async fn get_test(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TestDetailResponse>, ApiError> {
    let test_id: TestId = path_id("test", &id)?;
    let detail = state.tests.get_test(&actor, test_id).await?;
    let reveal = detail.reveal_answers;
    Ok(Json(TestDetailResponse {
        test: test_response(detail.test),
        questions: detail
            .questions
            .into_iter()
            .map(|q| question_response(q, reveal))
            .collect(),
    }))
}

/// 更新测试信息。
async fn update_test(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateTestRequest>,
) -> Result<Json<TestResponse>, ApiError> {
    let test_id: TestId = path_id("test", &id)?;
    let test = state.tests.update_test(&actor, test_id, request).await?;
    Ok(Json(test_response(test)))
}

/// 删除测试。
async fn delete_test(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let test_id: TestId = path_id("test", &id)?;
    state.tests.delete_test(&actor, test_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 变更发布状态。
async fn change_status(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateTestStatusRequest>,
) -> Result<Json<TestResponse>, ApiError> {
    let test_id: TestId = path_id("test", &id)?;
    let test = state
        .tests
        .change_status(&actor, test_id, &request.status)
        .await?;
    Ok(Json(test_response(test)))
}

/// 新增题目（仅草稿）。
async fn add_question(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<QuestionRequest>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    let test_id: TestId = path_id("test", &id)?;
    let question = state.tests.add_question(&actor, test_id, request).await?;
    Ok((StatusCode::CREATED, Json(question_response(question, true))))
}

/// 修改题目（仅草稿）。
async fn update_question(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path((id, question_id)): Path<(String, String)>,
    ApiJson(request): ApiJson<QuestionRequest>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let test_id: TestId = path_id("test", &id)?;
    let question_id: QuestionId = path_id("question", &question_id)?;
    let question = state
        .tests
        .update_question(&actor, test_id, question_id, request)
        .await?;
    Ok(Json(question_response(question, true)))
}

/// 删除题目（仅草稿）。
async fn delete_question(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path((id, question_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let test_id: TestId = path_id("test", &id)?;
    let question_id: QuestionId = path_id("question", &question_id)?;
    state
        .tests
        .delete_question(&actor, test_id, question_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 排行榜查询参数。
#[derive(Debug, Deserialize)]
struct LeaderboardQuery {
    /// 返回条数，默认 50，最多 200。
    limit: Option<usize>,
}

/// 首次作答的排行榜。
async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let Query(query) = query?;
    let test_id: TestId = path_id("test", &id)?;
    let limit = state.config.leaderboard_limit(query.limit);
    let ranked = state.exams.leaderboard(test_id, limit).await?;

    let entries = ranked
        .into_iter()
        .map(|entry| {
            let candidate = entry.candidate;
            LeaderboardEntryResponse {
                rank: entry.rank,
                student_id: candidate.item.student_id.to_string(),
                username: candidate.item.username,
                score: candidate.score,
                time_taken_minutes: time_taken_minutes(candidate.start_time, candidate.end_time),
                date: candidate.end_time,
            }
        })
        .collect();

    Ok(Json(LeaderboardResponse {
        test_id: test_id.to_string(),
        entries,
    }))
}
