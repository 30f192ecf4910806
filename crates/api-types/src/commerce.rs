use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Exactly one of `course_id` and `bundle_id` must be set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AddCartItemRequest {
    pub course_id: Option<String>,
    pub bundle_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemResponse {
    pub id: String,
    pub course_id: Option<String>,
    pub bundle_id: Option<String>,
    pub title: String,
    pub price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub course_id: Option<String>,
    pub bundle_id: Option<String>,
    pub title: String,
    pub price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    pub total_cents: i64,
    pub items: Vec<OrderItemResponse>,
    pub created_at: NaiveDateTime,
    pub paid_at: Option<NaiveDateTime>,
}
