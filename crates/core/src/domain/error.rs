use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("invalid rating: {0}. rating must be in [1, 5]")]
    InvalidRating(u8),
    #[error("invalid price: {0}. price must not be negative")]
    NegativePrice(i64),
    #[error("invalid price: {0}. price exceeds the maximum")]
    PriceTooLarge(i64),
    #[error("total price exceeds the maximum")]
    TotalTooLarge,
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("unknown test status: {0}")]
    UnknownTestStatus(String),
    #[error("unknown question type: {0}")]
    UnknownQuestionKind(String),
    #[error("unknown session status: {0}")]
    UnknownSessionStatus(String),
    #[error("unknown order status: {0}")]
    UnknownOrderStatus(String),
    #[error("unknown badge metric: {0}")]
    UnknownBadgeMetric(String),
    #[error("test status cannot change from {from} to {to}")]
    InvalidTestTransition { from: &'static str, to: &'static str },
    #[error("order status cannot change from {from} to {to}")]
    InvalidOrderTransition { from: &'static str, to: &'static str },
    #[error("invalid question: {0}")]
    InvalidQuestion(String),
    #[error("invalid marks: {0}. marks must be positive")]
    InvalidMarks(f64),
    #[error("invalid negative marks: {0}. negative marks must not be negative")]
    InvalidNegativeMarks(f64),
    #[error("invalid duration: {0} minutes")]
    InvalidDuration(i32),
    #[error("invalid milestone: {0} days")]
    InvalidMilestone(i32),
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("{field} is too long: {len} characters (max {max})")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}
