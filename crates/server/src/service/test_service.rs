use crate::repository::test_repository::{
    NewTest, QuestionRecord, TestChanges, TestRecord, TestRepository,
};
use crate::service::auth_service::AuthenticatedUser;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::{ensure_author, ensure_owner};
use coursehub_api_types::exam::{CreateTestRequest, QuestionRequest, UpdateTestRequest};
use coursehub_core::domain::{
    AnswerKey, DomainError, QuestionId, QuestionKind, Role, TestId, TestStatus, required_text,
    round_marks,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

const NAME_MAX: usize = 200;
const SUBJECT_MAX: usize = 100;
const QUESTION_TEXT_MAX: usize = 5_000;
const MAX_DURATION_MINUTES: i32 = 24 * 60;

fn validate_duration(minutes: i32) -> ServiceResult<i32> {
    if !(1..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(DomainError::InvalidDuration(minutes).into());
    }
    Ok(minutes)
}

fn answer_key(request: &QuestionRequest) -> ServiceResult<AnswerKey> {
    let kind = QuestionKind::from_str(request.question_type.trim())?;
    Ok(AnswerKey::new(
        kind,
        request.options.clone(),
        request.correct_answers.clone(),
        request.marks,
        request.negative_marks,
    )?)
}

/// A test with its questions. Answers are only revealed to the author.
#[derive(Debug, Clone)]
pub struct TestDetail {
    pub test: TestRecord,
    pub questions: Vec<QuestionRecord>,
    pub reveal_answers: bool,
}

pub struct TestService {
    tests: Arc<dyn TestRepository>,
}

impl TestService {
    pub fn new(tests: Arc<dyn TestRepository>) -> Self {
        Self { tests }
    }

    async fn test(&self, test_id: TestId) -> ServiceResult<TestRecord> {
        self.tests
            .find_by_id(test_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("test"))
    }

    async fn owned_test(
        &self,
        actor: &AuthenticatedUser,
        test_id: TestId,
    ) -> ServiceResult<TestRecord> {
        let test = self.test(test_id).await?;
        ensure_owner(actor, test.educator_id, "test")?;
        Ok(test)
    }

    async fn editable_test(
        &self,
        actor: &AuthenticatedUser,
        test_id: TestId,
    ) -> ServiceResult<TestRecord> {
        let test = self.owned_test(actor, test_id).await?;
        if !test.status.questions_editable() {
            return Err(ServiceError::Conflict(format!(
                "questions of a {} test cannot be changed",
                test.status
            )));
        }
        Ok(test)
    }

    /// Recomputes the cached question count and total marks.
    async fn refresh_totals(&self, test: &TestRecord) -> ServiceResult<TestRecord> {
        let questions = self.tests.list_questions(test.id).await?;
        let total_marks = round_marks(questions.iter().map(|q| q.key.marks).sum());

        self.tests
            .set_status(test.id, test.status, questions.len() as i32, total_marks)
            .await?
            .ok_or_else(|| ServiceError::not_found("test"))
    }

    #[tracing::instrument(skip(self, request), fields(educator_id = %actor.id))]
    pub async fn create_test(
        &self,
        actor: &AuthenticatedUser,
        request: CreateTestRequest,
    ) -> ServiceResult<TestRecord> {
        ensure_author(actor)?;

        let subject = request.subject.trim().to_string();
        if subject.chars().count() > SUBJECT_MAX {
            return Err(DomainError::FieldTooLong {
                field: "subject",
                len: subject.chars().count(),
                max: SUBJECT_MAX,
            }
            .into());
        }

        let test = self
            .tests
            .create(NewTest {
                educator_id: actor.id,
                name: required_text("name", request.name, NAME_MAX)?,
                subject,
                duration_minutes: validate_duration(request.duration_minutes)?,
                allow_retake: request.allow_retake,
            })
            .await?;

        info!(test_id = %test.id, "test created");
        Ok(test)
    }

    #[tracing::instrument(skip(self, request), fields(actor_id = %actor.id))]
    pub async fn update_test(
        &self,
        actor: &AuthenticatedUser,
        test_id: TestId,
        request: UpdateTestRequest,
    ) -> ServiceResult<TestRecord> {
        let test = self.owned_test(actor, test_id).await?;
        // live sessions depend on the duration
        if request.duration_minutes.is_some() && test.status != TestStatus::Draft {
            return Err(ServiceError::Conflict(
                "duration can only be changed while the test is a draft".to_string(),
            ));
        }

        let changes = TestChanges {
            name: request
                .name
                .map(|n| required_text("name", n, NAME_MAX))
                .transpose()?,
            subject: request
                .subject
                .map(|s| required_text("subject", s, SUBJECT_MAX))
                .transpose()?,
            duration_minutes: request.duration_minutes.map(validate_duration).transpose()?,
            allow_retake: request.allow_retake,
        };

        self.tests
            .update(test_id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("test"))
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn change_status(
        &self,
        actor: &AuthenticatedUser,
        test_id: TestId,
        status: &str,
    ) -> ServiceResult<TestRecord> {
        let test = self.owned_test(actor, test_id).await?;
        let requested = TestStatus::from_str(status.trim())?;
        let next = test.status.transition_to(requested)?;

        let questions = self.tests.list_questions(test_id).await?;
        if next == TestStatus::Published && questions.is_empty() {
            return Err(ServiceError::Validation(
                "a test needs at least one question before it is published".to_string(),
            ));
        }
        let total_marks = round_marks(questions.iter().map(|q| q.key.marks).sum());

        let updated = self
            .tests
            .set_status(test_id, next, questions.len() as i32, total_marks)
            .await?
            .ok_or_else(|| ServiceError::not_found("test"))?;

        info!(from = %test.status, to = %updated.status, "test status changed");
        Ok(updated)
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn delete_test(&self, actor: &AuthenticatedUser, test_id: TestId) -> ServiceResult<()> {
        self.owned_test(actor, test_id).await?;
        self.tests.delete(test_id).await?;
        info!("test deleted");
        Ok(())
    }

    /// Published tests for everyone; authors and admins also see drafts
    /// and archived tests they manage.
    pub async fn get_test(
        &self,
        viewer: &AuthenticatedUser,
        test_id: TestId,
    ) -> ServiceResult<TestDetail> {
        let test = self.test(test_id).await?;
        let manages = viewer.role == Role::Admin || viewer.id == test.educator_id;
        if !manages && test.status != TestStatus::Published {
            return Err(ServiceError::not_found("test"));
        }

        let questions = self.tests.list_questions(test_id).await?;
        Ok(TestDetail {
            test,
            questions,
            reveal_answers: manages,
        })
    }

    pub async fn list_tests(&self) -> ServiceResult<Vec<TestRecord>> {
        Ok(self.tests.list_published().await?)
    }

    pub async fn list_own_tests(&self, actor: &AuthenticatedUser) -> ServiceResult<Vec<TestRecord>> {
        ensure_author(actor)?;
        Ok(self.tests.list_by_educator(actor.id).await?)
    }

    #[tracing::instrument(skip(self, request), fields(actor_id = %actor.id))]
    pub async fn add_question(
        &self,
        actor: &AuthenticatedUser,
        test_id: TestId,
        request: QuestionRequest,
    ) -> ServiceResult<QuestionRecord> {
        let test = self.editable_test(actor, test_id).await?;
        let key = answer_key(&request)?;
        let text = required_text("question_text", request.question_text, QUESTION_TEXT_MAX)?;

        let question = self.tests.add_question(test_id, text, key).await?;
        self.refresh_totals(&test).await?;

        info!(question_id = %question.id, position = question.position, "question added");
        Ok(question)
    }

    #[tracing::instrument(skip(self, request), fields(actor_id = %actor.id))]
    pub async fn update_question(
        &self,
        actor: &AuthenticatedUser,
        test_id: TestId,
        question_id: QuestionId,
        request: QuestionRequest,
    ) -> ServiceResult<QuestionRecord> {
        let test = self.editable_test(actor, test_id).await?;
        let belongs = self
            .tests
            .list_questions(test_id)
            .await?
            .iter()
            .any(|q| q.id == question_id);
        if !belongs {
            return Err(ServiceError::not_found("question"));
        }

        let key = answer_key(&request)?;
        let text = required_text("question_text", request.question_text, QUESTION_TEXT_MAX)?;
        let question = self
            .tests
            .update_question(question_id, text, key)
            .await?
            .ok_or_else(|| ServiceError::not_found("question"))?;
        self.refresh_totals(&test).await?;

        Ok(question)
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn delete_question(
        &self,
        actor: &AuthenticatedUser,
        test_id: TestId,
        question_id: QuestionId,
    ) -> ServiceResult<()> {
        let test = self.editable_test(actor, test_id).await?;
        if !self.tests.delete_question(test_id, question_id).await? {
            return Err(ServiceError::not_found("question"));
        }
        self.refresh_totals(&test).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: &str, options: &[&str], correct: &[&str]) -> QuestionRequest {
        QuestionRequest {
            question_text: "What is it?".to_string(),
            question_type: kind.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answers: correct.iter().map(|c| c.to_string()).collect(),
            marks: 4.0,
            negative_marks: 1.0,
        }
    }

    #[test]
    fn test_unknown_question_type_is_a_validation_error() {
        let err = answer_key(&request("essay", &[], &["x"])).expect_err("unknown type");
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn test_true_false_options_are_fixed() {
        let key = answer_key(&request("true_false", &["yes", "no"], &["true"])).expect("valid");
        assert_eq!(key.options, vec!["true", "false"]);
    }

    #[test]
    fn test_duration_bounds() {
        assert!(validate_duration(0).is_err());
        assert!(validate_duration(MAX_DURATION_MINUTES + 1).is_err());
        assert_eq!(validate_duration(90).expect("valid"), 90);
    }
}
