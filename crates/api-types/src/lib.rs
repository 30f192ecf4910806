//! Shared request/response types used by API-facing crates.

use serde::{Deserialize, Serialize};

pub mod auth;
pub mod catalog;
pub mod commerce;
pub mod exam;
pub mod streak;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
}

impl HealthCheckResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
}

/// Body returned by endpoints that only acknowledge an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_check_ok_payload() {
        let response = HealthCheckResponse::ok();
        assert_eq!(response.status, "ok");
    }

    #[test]
    fn error_response_uses_error_field() {
        let response = ErrorResponse {
            code: "NOT_FOUND".to_string(),
            error: "test not found".to_string(),
        };

        let json = serde_json::to_value(&response).expect("serialize error response");

        assert_eq!(json["error"], "test not found");
        assert_eq!(json["code"], "NOT_FOUND");
    }
}
