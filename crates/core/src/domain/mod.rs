mod badge;
mod error;
mod exam_session;
mod grading;
mod ids;
mod leaderboard;
mod order_status;
mod price;
mod question;
mod rating;
mod role;
mod streak;
mod test_status;
mod text;

pub use badge::{BadgeMetric, Milestone, newly_earned};
pub use error::DomainError;
pub use exam_session::{
    PriorAttempt, SessionClock, SessionStatus, StartDecision, StartPlan, plan_start,
    time_taken_minutes, time_taken_seconds,
};
pub use grading::{
    AnswerSheet, GradeReport, NUMERICAL_TOLERANCE, QuestionGrade, Verdict, grade, judge,
    round_marks,
};
pub use ids::{
    AnnouncementId, BadgeId, BundleId, CartItemId, CourseId, ExamSessionId, FaqId, OrderId,
    QuestionId, ReviewId, TestId, UserId,
};
pub use leaderboard::{LeaderboardCandidate, Ranked, rank};
pub use order_status::OrderStatus;
pub use price::Price;
pub use question::{AnswerKey, QuestionKind};
pub use rating::{Rating, RatingSummary};
pub use role::Role;
pub use streak::{ActivityOutcome, Streak};
pub use test_status::TestStatus;
pub use text::required_text;
