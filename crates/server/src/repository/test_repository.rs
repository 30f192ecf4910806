use crate::entity::{question, test};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use coursehub_core::domain::{AnswerKey, QuestionId, QuestionKind, TestId, TestStatus, UserId};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder,
};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct TestRecord {
    pub id: TestId,
    pub educator_id: UserId,
    pub name: String,
    pub subject: String,
    pub duration_minutes: i32,
    pub total_marks: f64,
    pub num_questions: i32,
    pub status: TestStatus,
    pub allow_retake: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTest {
    pub educator_id: UserId,
    pub name: String,
    pub subject: String,
    pub duration_minutes: i32,
    pub allow_retake: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TestChanges {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub duration_minutes: Option<i32>,
    pub allow_retake: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub test_id: TestId,
    pub position: i32,
    pub question_text: String,
    pub key: AnswerKey,
}

#[async_trait]
pub trait TestRepository: Send + Sync {
    async fn create(&self, new_test: NewTest) -> Result<TestRecord>;
    async fn find_by_id(&self, test_id: TestId) -> Result<Option<TestRecord>>;
    async fn list_published(&self) -> Result<Vec<TestRecord>>;
    async fn list_by_educator(&self, educator_id: UserId) -> Result<Vec<TestRecord>>;
    async fn update(&self, test_id: TestId, changes: TestChanges) -> Result<Option<TestRecord>>;
    /// Changes the status and refreshes the cached question count and marks.
    async fn set_status(
        &self,
        test_id: TestId,
        status: TestStatus,
        num_questions: i32,
        total_marks: f64,
    ) -> Result<Option<TestRecord>>;
    async fn delete(&self, test_id: TestId) -> Result<bool>;

    async fn add_question(
        &self,
        test_id: TestId,
        question_text: String,
        key: AnswerKey,
    ) -> Result<QuestionRecord>;
    async fn update_question(
        &self,
        question_id: QuestionId,
        question_text: String,
        key: AnswerKey,
    ) -> Result<Option<QuestionRecord>>;
    async fn delete_question(&self, test_id: TestId, question_id: QuestionId) -> Result<bool>;
    async fn list_questions(&self, test_id: TestId) -> Result<Vec<QuestionRecord>>;
}

#[derive(Clone)]
pub struct SeaOrmTestRepository {
    db: DatabaseConnection,
}

impl SeaOrmTestRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn map_status(code: i16) -> Result<TestStatus> {
        match code {
            0 => Ok(TestStatus::Draft),
            1 => Ok(TestStatus::Published),
            2 => Ok(TestStatus::Archived),
            _ => Err(anyhow!("invalid test.status code from database: {code}")),
        }
    }

    fn map_status_code(status: TestStatus) -> i16 {
        match status {
            TestStatus::Draft => 0,
            TestStatus::Published => 1,
            TestStatus::Archived => 2,
        }
    }

    fn map_kind(code: i16) -> Result<QuestionKind> {
        match code {
            0 => Ok(QuestionKind::Mcq),
            1 => Ok(QuestionKind::MultipleCorrect),
            2 => Ok(QuestionKind::TrueFalse),
            3 => Ok(QuestionKind::Numerical),
            _ => Err(anyhow!("invalid question.question_type code from database: {code}")),
        }
    }

    fn map_kind_code(kind: QuestionKind) -> i16 {
        match kind {
            QuestionKind::Mcq => 0,
            QuestionKind::MultipleCorrect => 1,
            QuestionKind::TrueFalse => 2,
            QuestionKind::Numerical => 3,
        }
    }

    fn map_model(model: test::Model) -> Result<TestRecord> {
        let id = TestId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid test.id '{}' from database: {e}", model.id))?;
        let educator_id = UserId::from_str(&model.educator_id).map_err(|e| {
            anyhow!(
                "invalid test.educator_id '{}' from database: {e}",
                model.educator_id
            )
        })?;

        Ok(TestRecord {
            id,
            educator_id,
            name: model.name,
            subject: model.subject,
            duration_minutes: model.duration_minutes,
            total_marks: model.total_marks,
            num_questions: model.num_questions,
            status: Self::map_status(model.status)?,
            allow_retake: model.allow_retake,
            created_at: model.created_at,
        })
    }

    fn map_question(model: question::Model) -> Result<QuestionRecord> {
        let id = QuestionId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid question.id '{}' from database: {e}", model.id))?;
        let test_id = TestId::from_str(&model.test_id).map_err(|e| {
            anyhow!(
                "invalid question.test_id '{}' from database: {e}",
                model.test_id
            )
        })?;
        let options: Vec<String> = serde_json::from_str(&model.options)
            .with_context(|| format!("invalid question.options for question {}", model.id))?;
        let correct_answers: Vec<String> = serde_json::from_str(&model.correct_answers)
            .with_context(|| format!("invalid question.correct_answers for question {}", model.id))?;

        let key = AnswerKey::new(
            Self::map_kind(model.question_type)?,
            options,
            correct_answers,
            model.marks,
            model.negative_marks,
        )?;

        Ok(QuestionRecord {
            id,
            test_id,
            position: model.position,
            question_text: model.question_text,
            key,
        })
    }
}

#[async_trait]
impl TestRepository for SeaOrmTestRepository {
    async fn create(&self, new_test: NewTest) -> Result<TestRecord> {
        let id = TestId::new();
        let now = Utc::now().naive_utc();

        let active_model = test::ActiveModel {
            id: Set(id.to_string()),
            educator_id: Set(new_test.educator_id.to_string()),
            name: Set(new_test.name),
            subject: Set(new_test.subject),
            duration_minutes: Set(new_test.duration_minutes),
            total_marks: Set(0.0),
            num_questions: Set(0),
            status: Set(Self::map_status_code(TestStatus::Draft)),
            allow_retake: Set(new_test.allow_retake),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        Self::map_model(model)
    }

    async fn find_by_id(&self, test_id: TestId) -> Result<Option<TestRecord>> {
        let model = test::Entity::find_by_id(test_id.to_string())
            .one(&self.db)
            .await?;

        model.map(Self::map_model).transpose()
    }

    async fn list_published(&self) -> Result<Vec<TestRecord>> {
        let models = test::Entity::find()
            .filter(test::Column::Status.eq(Self::map_status_code(TestStatus::Published)))
            .order_by_desc(test::Column::CreatedAt)
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::map_model).collect()
    }

    async fn list_by_educator(&self, educator_id: UserId) -> Result<Vec<TestRecord>> {
        let models = test::Entity::find()
            .filter(test::Column::EducatorId.eq(educator_id.to_string()))
            .order_by_desc(test::Column::CreatedAt)
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::map_model).collect()
    }

    async fn update(&self, test_id: TestId, changes: TestChanges) -> Result<Option<TestRecord>> {
        let Some(model) = test::Entity::find_by_id(test_id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let mut active_model = model.into_active_model();
        if let Some(name) = changes.name {
            active_model.name = Set(name);
        }
        if let Some(subject) = changes.subject {
            active_model.subject = Set(subject);
        }
        if let Some(duration_minutes) = changes.duration_minutes {
            active_model.duration_minutes = Set(duration_minutes);
        }
        if let Some(allow_retake) = changes.allow_retake {
            active_model.allow_retake = Set(allow_retake);
        }
        active_model.updated_at = Set(Utc::now().naive_utc());

        let updated = active_model.update(&self.db).await?;
        Self::map_model(updated).map(Some)
    }

    async fn set_status(
        &self,
        test_id: TestId,
        status: TestStatus,
        num_questions: i32,
        total_marks: f64,
    ) -> Result<Option<TestRecord>> {
        let Some(model) = test::Entity::find_by_id(test_id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let mut active_model = model.into_active_model();
        active_model.status = Set(Self::map_status_code(status));
        active_model.num_questions = Set(num_questions);
        active_model.total_marks = Set(total_marks);
        active_model.updated_at = Set(Utc::now().naive_utc());

        let updated = active_model.update(&self.db).await?;
        Self::map_model(updated).map(Some)
    }

    async fn delete(&self, test_id: TestId) -> Result<bool> {
        let result = test::Entity::delete_by_id(test_id.to_string())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn add_question(
        &self,
        test_id: TestId,
        question_text: String,
        key: AnswerKey,
    ) -> Result<QuestionRecord> {
        let position = question::Entity::find()
            .filter(question::Column::TestId.eq(test_id.to_string()))
            .order_by_desc(question::Column::Position)
            .one(&self.db)
            .await?
            .map_or(0, |last| last.position + 1);

        let active_model = question::ActiveModel {
            id: Set(QuestionId::new().to_string()),
            test_id: Set(test_id.to_string()),
            position: Set(position),
            question_text: Set(question_text),
            question_type: Set(Self::map_kind_code(key.kind)),
            options: Set(serde_json::to_string(&key.options)?),
            correct_answers: Set(serde_json::to_string(&key.correct_answers)?),
            marks: Set(key.marks),
            negative_marks: Set(key.negative_marks),
        };

        let model = active_model.insert(&self.db).await?;
        Self::map_question(model)
    }

    async fn update_question(
        &self,
        question_id: QuestionId,
        question_text: String,
        key: AnswerKey,
    ) -> Result<Option<QuestionRecord>> {
        let Some(model) = question::Entity::find_by_id(question_id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let mut active_model = model.into_active_model();
        active_model.question_text = Set(question_text);
        active_model.question_type = Set(Self::map_kind_code(key.kind));
        active_model.options = Set(serde_json::to_string(&key.options)?);
        active_model.correct_answers = Set(serde_json::to_string(&key.correct_answers)?);
        active_model.marks = Set(key.marks);
        active_model.negative_marks = Set(key.negative_marks);

        let updated = active_model.update(&self.db).await?;
        Self::map_question(updated).map(Some)
    }

    async fn delete_question(&self, test_id: TestId, question_id: QuestionId) -> Result<bool> {
        let result = question::Entity::delete_many()
            .filter(question::Column::Id.eq(question_id.to_string()))
            .filter(question::Column::TestId.eq(test_id.to_string()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn list_questions(&self, test_id: TestId) -> Result<Vec<QuestionRecord>> {
        let models = question::Entity::find()
            .filter(question::Column::TestId.eq(test_id.to_string()))
            .order_by_asc(question::Column::Position)
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::map_question).collect()
    }
}
