use crate::entity::{exam_session, test, user};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use coursehub_core::domain::{AnswerSheet, ExamSessionId, QuestionId, SessionStatus, TestId, UserId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, SqlErr, TransactionTrait,
};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct ExamSessionRecord {
    pub id: ExamSessionId,
    pub test_id: TestId,
    pub student_id: UserId,
    pub status: SessionStatus,
    pub answers: AnswerSheet,
    pub marked_for_review: Vec<QuestionId>,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub score: Option<f64>,
    pub is_first_attempt: bool,
}

#[derive(Debug, Clone)]
pub struct NewExamSession {
    pub test_id: TestId,
    pub student_id: UserId,
    pub start_time: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct FinishedSession {
    pub status: SessionStatus,
    pub end_time: NaiveDateTime,
    pub score: f64,
    pub closed_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created(ExamSessionRecord),
    /// Another in-progress session for the same student and test won.
    AlreadyActive(ExamSessionRecord),
}

#[async_trait]
pub trait ExamSessionRepository: Send + Sync {
    /// Inserts the session unless the student already has one in progress
    /// for the test. `is_first_attempt` is decided inside the same
    /// transaction, and a unique index backs the in-progress check.
    async fn create_if_idle(&self, new_session: NewExamSession) -> Result<CreateOutcome>;
    async fn find_by_id(&self, session_id: ExamSessionId) -> Result<Option<ExamSessionRecord>>;
    async fn list_attempts(
        &self,
        test_id: TestId,
        student_id: UserId,
    ) -> Result<Vec<ExamSessionRecord>>;
    /// Replaces answers and review marks. Returns false when the session
    /// is no longer in progress.
    async fn save_answers(
        &self,
        session_id: ExamSessionId,
        answers: &AnswerSheet,
        marked_for_review: &[QuestionId],
        saved_at: NaiveDateTime,
    ) -> Result<bool>;
    /// Closes an in-progress session. Returns false when it was already closed.
    async fn finish(&self, session_id: ExamSessionId, finished: FinishedSession) -> Result<bool>;
    async fn list_by_student(&self, student_id: UserId)
    -> Result<Vec<(ExamSessionRecord, String)>>;
    /// Finished first attempts of a test with the student's username.
    async fn first_attempts(&self, test_id: TestId) -> Result<Vec<(ExamSessionRecord, String)>>;
}

#[derive(Clone)]
pub struct SeaOrmExamSessionRepository {
    db: DatabaseConnection,
}

impl SeaOrmExamSessionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn map_status(code: i16) -> Result<SessionStatus> {
        match code {
            0 => Ok(SessionStatus::InProgress),
            1 => Ok(SessionStatus::Submitted),
            2 => Ok(SessionStatus::Completed),
            _ => Err(anyhow!("invalid exam_session.status code from database: {code}")),
        }
    }

    fn map_status_code(status: SessionStatus) -> i16 {
        match status {
            SessionStatus::InProgress => 0,
            SessionStatus::Submitted => 1,
            SessionStatus::Completed => 2,
        }
    }

    fn encode_answers(answers: &AnswerSheet) -> Result<String> {
        let raw: BTreeMap<String, &Vec<String>> =
            answers.iter().map(|(id, a)| (id.to_string(), a)).collect();
        Ok(serde_json::to_string(&raw)?)
    }

    fn encode_marked(marked: &[QuestionId]) -> Result<String> {
        let raw: Vec<String> = marked.iter().map(|id| id.to_string()).collect();
        Ok(serde_json::to_string(&raw)?)
    }

    fn map_model(model: exam_session::Model) -> Result<ExamSessionRecord> {
        let id = ExamSessionId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid exam_session.id '{}' from database: {e}", model.id))?;
        let test_id = TestId::from_str(&model.test_id).map_err(|e| {
            anyhow!(
                "invalid exam_session.test_id '{}' from database: {e}",
                model.test_id
            )
        })?;
        let student_id = UserId::from_str(&model.student_id).map_err(|e| {
            anyhow!(
                "invalid exam_session.student_id '{}' from database: {e}",
                model.student_id
            )
        })?;

        let raw_answers: BTreeMap<String, Vec<String>> = serde_json::from_str(&model.answers)
            .with_context(|| format!("invalid exam_session.answers for session {}", model.id))?;
        let answers = raw_answers
            .into_iter()
            .map(|(question_id, selected)| {
                QuestionId::from_str(&question_id)
                    .map(|id| (id, selected))
                    .map_err(|e| anyhow!("invalid question id '{question_id}' in answers: {e}"))
            })
            .collect::<Result<AnswerSheet>>()?;

        let raw_marked: Vec<String> = serde_json::from_str(&model.marked_for_review)
            .with_context(|| {
                format!(
                    "invalid exam_session.marked_for_review for session {}",
                    model.id
                )
            })?;
        let marked_for_review = raw_marked
            .iter()
            .map(|raw| {
                QuestionId::from_str(raw)
                    .map_err(|e| anyhow!("invalid question id '{raw}' in review marks: {e}"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ExamSessionRecord {
            id,
            test_id,
            student_id,
            status: Self::map_status(model.status)?,
            answers,
            marked_for_review,
            start_time: model.start_time,
            end_time: model.end_time,
            score: model.score,
            is_first_attempt: model.is_first_attempt,
        })
    }

    async fn find_active<C: ConnectionTrait>(
        conn: &C,
        new_session: &NewExamSession,
    ) -> Result<Option<exam_session::Model>> {
        Ok(exam_session::Entity::find()
            .filter(exam_session::Column::TestId.eq(new_session.test_id.to_string()))
            .filter(exam_session::Column::StudentId.eq(new_session.student_id.to_string()))
            .filter(
                exam_session::Column::Status
                    .eq(Self::map_status_code(SessionStatus::InProgress)),
            )
            .one(conn)
            .await?)
    }

    fn with_username(
        (model, student): (exam_session::Model, Option<user::Model>),
    ) -> Result<(ExamSessionRecord, String)> {
        let username = student
            .map(|u| u.username)
            .ok_or_else(|| anyhow!("exam session {} has no student", model.id))?;
        Ok((Self::map_model(model)?, username))
    }
}

#[async_trait]
impl ExamSessionRepository for SeaOrmExamSessionRepository {
    async fn create_if_idle(&self, new_session: NewExamSession) -> Result<CreateOutcome> {
        let txn = self.db.begin().await?;

        if let Some(active) = Self::find_active(&txn, &new_session).await? {
            txn.commit().await?;
            return Ok(CreateOutcome::AlreadyActive(Self::map_model(active)?));
        }

        let earlier = exam_session::Entity::find()
            .filter(exam_session::Column::TestId.eq(new_session.test_id.to_string()))
            .filter(exam_session::Column::StudentId.eq(new_session.student_id.to_string()))
            .count(&txn)
            .await?;

        let inserted = exam_session::ActiveModel {
            id: Set(ExamSessionId::new().to_string()),
            test_id: Set(new_session.test_id.to_string()),
            student_id: Set(new_session.student_id.to_string()),
            status: Set(Self::map_status_code(SessionStatus::InProgress)),
            answers: Set("{}".to_string()),
            marked_for_review: Set("[]".to_string()),
            start_time: Set(new_session.start_time),
            end_time: Set(None),
            score: Set(None),
            is_first_attempt: Set(earlier == 0),
            created_at: Set(new_session.start_time),
            updated_at: Set(new_session.start_time),
        }
        .insert(&txn)
        .await;

        match inserted {
            Ok(model) => {
                txn.commit().await?;
                Ok(CreateOutcome::Created(Self::map_model(model)?))
            }
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                // a concurrent start inserted first
                txn.rollback().await?;
                let active = Self::find_active(&self.db, &new_session)
                    .await?
                    .ok_or_else(|| anyhow!("in-progress exam session vanished after conflict"))?;
                Ok(CreateOutcome::AlreadyActive(Self::map_model(active)?))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_id(&self, session_id: ExamSessionId) -> Result<Option<ExamSessionRecord>> {
        let model = exam_session::Entity::find_by_id(session_id.to_string())
            .one(&self.db)
            .await?;

        model.map(Self::map_model).transpose()
    }

    async fn list_attempts(
        &self,
        test_id: TestId,
        student_id: UserId,
    ) -> Result<Vec<ExamSessionRecord>> {
        let models = exam_session::Entity::find()
            .filter(exam_session::Column::TestId.eq(test_id.to_string()))
            .filter(exam_session::Column::StudentId.eq(student_id.to_string()))
            .order_by_asc(exam_session::Column::StartTime)
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::map_model).collect()
    }

    async fn save_answers(
        &self,
        session_id: ExamSessionId,
        answers: &AnswerSheet,
        marked_for_review: &[QuestionId],
        saved_at: NaiveDateTime,
    ) -> Result<bool> {
        let result = exam_session::Entity::update_many()
            .col_expr(
                exam_session::Column::Answers,
                Expr::value(Self::encode_answers(answers)?),
            )
            .col_expr(
                exam_session::Column::MarkedForReview,
                Expr::value(Self::encode_marked(marked_for_review)?),
            )
            .col_expr(exam_session::Column::UpdatedAt, Expr::value(saved_at))
            .filter(exam_session::Column::Id.eq(session_id.to_string()))
            .filter(
                exam_session::Column::Status
                    .eq(Self::map_status_code(SessionStatus::InProgress)),
            )
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn finish(&self, session_id: ExamSessionId, finished: FinishedSession) -> Result<bool> {
        let result = exam_session::Entity::update_many()
            .col_expr(
                exam_session::Column::Status,
                Expr::value(Self::map_status_code(finished.status)),
            )
            .col_expr(
                exam_session::Column::EndTime,
                Expr::value(Some(finished.end_time)),
            )
            .col_expr(exam_session::Column::Score, Expr::value(Some(finished.score)))
            .col_expr(
                exam_session::Column::UpdatedAt,
                Expr::value(finished.closed_at),
            )
            .filter(exam_session::Column::Id.eq(session_id.to_string()))
            .filter(
                exam_session::Column::Status
                    .eq(Self::map_status_code(SessionStatus::InProgress)),
            )
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn list_by_student(
        &self,
        student_id: UserId,
    ) -> Result<Vec<(ExamSessionRecord, String)>> {
        let rows = exam_session::Entity::find()
            .filter(exam_session::Column::StudentId.eq(student_id.to_string()))
            .order_by_desc(exam_session::Column::StartTime)
            .find_also_related(test::Entity)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|(model, test)| {
                let test_name = test
                    .map(|t| t.name)
                    .ok_or_else(|| anyhow!("exam session {} has no test", model.id))?;
                Ok((Self::map_model(model)?, test_name))
            })
            .collect()
    }

    async fn first_attempts(&self, test_id: TestId) -> Result<Vec<(ExamSessionRecord, String)>> {
        let rows = exam_session::Entity::find()
            .filter(exam_session::Column::TestId.eq(test_id.to_string()))
            .filter(exam_session::Column::IsFirstAttempt.eq(true))
            .filter(
                exam_session::Column::Status
                    .ne(Self::map_status_code(SessionStatus::InProgress)),
            )
            .find_also_related(user::Entity)
            .all(&self.db)
            .await?;

        rows.into_iter().map(Self::with_username).collect()
    }
}
