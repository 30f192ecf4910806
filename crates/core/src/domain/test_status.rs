use std::fmt;
use std::str::FromStr;

use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TestStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl TestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Draft => "draft",
            TestStatus::Published => "published",
            TestStatus::Archived => "archived",
        }
    }

    pub fn can_transition_to(self, next: TestStatus) -> bool {
        matches!(
            (self, next),
            (TestStatus::Draft, TestStatus::Published)
                | (TestStatus::Published, TestStatus::Archived)
                | (TestStatus::Archived, TestStatus::Published)
        )
    }

    pub fn transition_to(self, next: TestStatus) -> Result<TestStatus, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTestTransition {
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }

    /// Questions may only be edited before the test goes live.
    pub fn questions_editable(self) -> bool {
        self == TestStatus::Draft
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TestStatus::Draft),
            "published" => Ok(TestStatus::Published),
            "archived" => Ok(TestStatus::Archived),
            other => Err(DomainError::UnknownTestStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_can_be_published() {
        assert_eq!(
            TestStatus::Draft.transition_to(TestStatus::Published),
            Ok(TestStatus::Published)
        );
    }

    #[test]
    fn archived_test_can_be_republished() {
        assert!(TestStatus::Archived.can_transition_to(TestStatus::Published));
    }

    #[test]
    fn published_test_cannot_return_to_draft() {
        let err = TestStatus::Published
            .transition_to(TestStatus::Draft)
            .expect_err("published -> draft should be rejected");

        assert_eq!(
            err.to_string(),
            "test status cannot change from published to draft"
        );
    }

    #[test]
    fn only_drafts_have_editable_questions() {
        assert!(TestStatus::Draft.questions_editable());
        assert!(!TestStatus::Published.questions_editable());
        assert!(!TestStatus::Archived.questions_editable());
    }
}
