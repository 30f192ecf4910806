//! 考试会话 API 路由。
//!
//! 开始、保存作答、交卷与查看成绩。会话超时后由服务端自动结束。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use coursehub_api_types::exam::{
    ExamResultResponse, ExamSessionResponse, QuestionResultResponse, SaveAnswersRequest,
    SessionSummaryResponse, StartExamRequest,
};
use coursehub_core::domain::{ExamSessionId, TestId, Verdict, time_taken_minutes};

use super::error::ApiError;
use super::extract::{ApiJson, AuthUser, path_id};
use super::state::AppState;
use super::tests::question_response;
use crate::service::exam_service::{ExamResult, SessionView};
use crate::service::parse_id;

/// 创建考试 API 路由。
pub fn create_exam_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/exam/start", post(start))
        .route("/api/exam/sessions", get(list_sessions))
        .route("/api/exam/sessions/{id}", get(get_session))
        .route("/api/exam/sessions/{id}/answers", put(save_answers))
        .route("/api/exam/sessions/{id}/submit", post(submit))
        .route("/api/exam/sessions/{id}/result", get(result))
}

fn session_response(view: SessionView) -> ExamSessionResponse {
    let remaining_seconds = view.remaining_seconds();
    let deadline = view.clock.deadline();
    let session = view.session;
    let reveal = session.status.is_finished();

    ExamSessionResponse {
        id: session.id.to_string(),
        test_id: session.test_id.to_string(),
        student_id: session.student_id.to_string(),
        status: session.status.as_str().to_string(),
        is_first_attempt: session.is_first_attempt,
        start_time: session.start_time,
        deadline,
        end_time: session.end_time,
        remaining_seconds,
        answers: session
            .answers
            .into_iter()
            .map(|(id, selected)| (id.to_string(), selected))
            .collect(),
        marked_for_review: session
            .marked_for_review
            .iter()
            .map(ToString::to_string)
            .collect(),
        score: session.score,
        questions: view
            .questions
            .into_iter()
            .map(|q| question_response(q, reveal))
            .collect(),
    }
}

fn result_response(result: ExamResult) -> ExamResultResponse {
    let ExamResult {
        session,
        test,
        questions,
        report,
        end_time,
    } = result;

    let breakdown = questions
        .into_iter()
        .map(|question| {
            let (verdict, awarded) = report
                .grade_for(question.id)
                .map_or((Verdict::Unanswered, 0.0), |g| (g.verdict, g.awarded));
            QuestionResultResponse {
                question_id: question.id.to_string(),
                selected: session.answers.get(&question.id).cloned().unwrap_or_default(),
                correct_answers: question.key.correct_answers,
                verdict: verdict.as_str().to_string(),
                awarded,
            }
        })
        .collect();

    ExamResultResponse {
        session_id: session.id.to_string(),
        test_id: session.test_id.to_string(),
        status: session.status.as_str().to_string(),
        is_first_attempt: session.is_first_attempt,
        score: session.score.unwrap_or(report.score),
        total_marks: test.total_marks,
        correct: report.correct,
        incorrect: report.incorrect,
        unanswered: report.unanswered,
        time_taken_minutes: time_taken_minutes(session.start_time, end_time),
        start_time: session.start_time,
        end_time,
        breakdown,
    }
}

/// 开始考试；已有未超时的会话时直接返回该会话。
async fn start(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    ApiJson(request): ApiJson<StartExamRequest>,
) -> Result<(StatusCode, Json<ExamSessionResponse>), ApiError> {
    let test_id: TestId = parse_id("test id", &request.test_id)?;
    let view = state.exams.start(&actor, test_id).await?;
    Ok((StatusCode::CREATED, Json(session_response(view))))
}

/// 列出当前学生的全部会话。
async fn list_sessions(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Vec<SessionSummaryResponse>>, ApiError> {
    let sessions = state.exams.list_sessions(&actor).await?;
    Ok(Json(
        sessions
            .into_iter()
            .map(|(session, test_name)| SessionSummaryResponse {
                id: session.id.to_string(),
                test_id: session.test_id.to_string(),
                test_name,
                status: session.status.as_str().to_string(),
                is_first_attempt: session.is_first_attempt,
                score: session.score,
                start_time: session.start_time,
                end_time: session.end_time,
            })
            .collect(),
    ))
}

/// 获取会话；超时的会话会先被结束。
async fn get_session(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ExamSessionResponse>, ApiError> {
    let session_id: ExamSessionId = path_id("exam session", &id)?;
    let view = state.exams.get_session(&actor, session_id).await?;
    Ok(Json(session_response(view)))
}

/// 整体替换作答与标记。
async fn save_answers(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<SaveAnswersRequest>,
) -> Result<Json<ExamSessionResponse>, ApiError> {
    let session_id: ExamSessionId = path_id("exam session", &id)?;
    let view = state
        .exams
        .save_answers(&actor, session_id, request)
        .await?;
    Ok(Json(session_response(view)))
}

/// 交卷并评分。
async fn submit(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ExamResultResponse>, ApiError> {
    let session_id: ExamSessionId = path_id("exam session", &id)?;
    let result = state.exams.submit(&actor, session_id).await?;
    Ok(Json(result_response(result)))
}

/// 查看已结束会话的成绩明细。
async fn result(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ExamResultResponse>, ApiError> {
    let session_id: ExamSessionId = path_id("exam session", &id)?;
    let result = state.exams.result(&actor, session_id).await?;
    Ok(Json(result_response(result)))
}
