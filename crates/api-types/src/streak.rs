use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakResponse {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_activity_date: Option<NaiveDate>,
    pub total_active_days: i32,
    pub freeze_used: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub metric: String,
    pub milestone_days: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedBadgeResponse {
    pub badge: BadgeResponse,
    pub earned_at: NaiveDateTime,
    pub is_new: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub outcome: String,
    pub streak: StreakResponse,
    pub new_badges: Vec<EarnedBadgeResponse>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateBadgeRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub metric: String,
    pub milestone_days: i32,
}
