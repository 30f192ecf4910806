use coursehub_core::domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(what: &str) -> Self {
        ServiceError::NotFound(format!("{what} not found"))
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidTestTransition { .. } | DomainError::InvalidOrderTransition { .. } => {
                ServiceError::Conflict(err.to_string())
            }
            other => ServiceError::Validation(other.to_string()),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use coursehub_core::domain::TestStatus;

    #[test]
    fn transition_errors_are_conflicts() {
        let err = TestStatus::Draft
            .transition_to(TestStatus::Archived)
            .expect_err("draft cannot be archived");

        assert!(matches!(ServiceError::from(err), ServiceError::Conflict(_)));
    }

    #[test]
    fn validation_errors_keep_their_message() {
        let err = ServiceError::from(DomainError::InvalidRating(9));

        match err {
            ServiceError::Validation(message) => assert!(message.contains('9')),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
