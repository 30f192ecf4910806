use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseResponse {
    pub id: String,
    pub educator_id: String,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub published: bool,
    pub average_rating: Option<f64>,
    pub review_count: u64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateBundleRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    pub course_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleResponse {
    pub id: String,
    pub educator_id: String,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub course_ids: Vec<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateReviewRequest {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub id: String,
    pub course_id: String,
    pub student_id: String,
    pub username: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseReviewsResponse {
    pub average_rating: Option<f64>,
    pub review_count: u64,
    pub reviews: Vec<ReviewResponse>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementResponse {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub body: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateFaqRequest {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqResponse {
    pub id: String,
    pub course_id: String,
    pub question: String,
    pub answer: String,
    pub position: i32,
}
