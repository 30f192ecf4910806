use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateTestRequest {
    pub name: String,
    #[serde(default)]
    pub subject: String,
    pub duration_minutes: i32,
    #[serde(default)]
    pub allow_retake: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateTestRequest {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub duration_minutes: Option<i32>,
    pub allow_retake: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateTestStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResponse {
    pub id: String,
    pub educator_id: String,
    pub name: String,
    pub subject: String,
    pub duration_minutes: i32,
    pub total_marks: f64,
    pub num_questions: i32,
    pub status: String,
    pub allow_retake: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuestionRequest {
    pub question_text: String,
    pub question_type: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answers: Vec<String>,
    pub marks: f64,
    #[serde(default)]
    pub negative_marks: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub id: String,
    pub position: i32,
    pub question_text: String,
    pub question_type: String,
    pub options: Vec<String>,
    /// Only present for the test's author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answers: Option<Vec<String>>,
    pub marks: f64,
    pub negative_marks: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDetailResponse {
    pub test: TestResponse,
    pub questions: Vec<QuestionResponse>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StartExamRequest {
    pub test_id: String,
}

/// A single selection or several; both are stored as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerInput {
    One(String),
    Many(Vec<String>),
}

impl AnswerInput {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            AnswerInput::One(value) => vec![value],
            AnswerInput::Many(values) => values,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SaveAnswersRequest {
    #[serde(default)]
    pub answers: BTreeMap<String, AnswerInput>,
    #[serde(default)]
    pub marked_for_review: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSessionResponse {
    pub id: String,
    pub test_id: String,
    pub student_id: String,
    pub status: String,
    pub is_first_attempt: bool,
    pub start_time: NaiveDateTime,
    pub deadline: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub remaining_seconds: i64,
    pub answers: BTreeMap<String, Vec<String>>,
    pub marked_for_review: Vec<String>,
    pub score: Option<f64>,
    pub questions: Vec<QuestionResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResultResponse {
    pub question_id: String,
    pub selected: Vec<String>,
    pub correct_answers: Vec<String>,
    pub verdict: String,
    pub awarded: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResultResponse {
    pub session_id: String,
    pub test_id: String,
    pub status: String,
    pub is_first_attempt: bool,
    pub score: f64,
    pub total_marks: f64,
    pub correct: u32,
    pub incorrect: u32,
    pub unanswered: u32,
    pub time_taken_minutes: f64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub breakdown: Vec<QuestionResultResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummaryResponse {
    pub id: String,
    pub test_id: String,
    pub test_name: String,
    pub status: String,
    pub is_first_attempt: bool,
    pub score: Option<f64>,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntryResponse {
    pub rank: u32,
    pub student_id: String,
    pub username: String,
    pub score: f64,
    pub time_taken_minutes: f64,
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub test_id: String,
    pub entries: Vec<LeaderboardEntryResponse>,
}
