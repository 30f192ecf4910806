use crate::clock::Clock;
use crate::repository::exam_session_repository::{
    CreateOutcome, ExamSessionRecord, ExamSessionRepository, FinishedSession, NewExamSession,
};
use crate::repository::test_repository::{QuestionRecord, TestRecord, TestRepository};
use crate::service::auth_service::AuthenticatedUser;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::parse_id;
use crate::service::streak_service::StreakService;
use chrono::NaiveDateTime;
use coursehub_api_types::exam::SaveAnswersRequest;
use coursehub_core::domain::{
    AnswerKey, AnswerSheet, ExamSessionId, GradeReport, LeaderboardCandidate, PriorAttempt,
    QuestionId, Ranked, Role, SessionClock, SessionStatus, StartDecision, TestId, TestStatus,
    UserId, grade, plan_start, rank,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// An in-progress or finished session together with its test.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub session: ExamSessionRecord,
    pub test: TestRecord,
    pub questions: Vec<QuestionRecord>,
    pub clock: SessionClock,
    pub now: NaiveDateTime,
}

impl SessionView {
    pub fn remaining_seconds(&self) -> i64 {
        match self.session.status {
            SessionStatus::InProgress => self.clock.remaining_seconds(self.now),
            SessionStatus::Submitted | SessionStatus::Completed => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExamResult {
    pub session: ExamSessionRecord,
    pub test: TestRecord,
    pub questions: Vec<QuestionRecord>,
    pub report: GradeReport,
    pub end_time: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct LeaderboardRow {
    pub student_id: UserId,
    pub username: String,
}

pub struct ExamService {
    tests: Arc<dyn TestRepository>,
    sessions: Arc<dyn ExamSessionRepository>,
    streaks: Arc<StreakService>,
    clock: Arc<dyn Clock>,
}

impl ExamService {
    pub fn new(
        tests: Arc<dyn TestRepository>,
        sessions: Arc<dyn ExamSessionRepository>,
        streaks: Arc<StreakService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tests,
            sessions,
            streaks,
            clock,
        }
    }

    async fn test(&self, test_id: TestId) -> ServiceResult<TestRecord> {
        self.tests
            .find_by_id(test_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("test"))
    }

    async fn session(&self, session_id: ExamSessionId) -> ServiceResult<ExamSessionRecord> {
        self.sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("exam session"))
    }

    /// Students only reach their own sessions. Admins and the test's
    /// author may look at any session of the test.
    fn ensure_can_view(
        actor: &AuthenticatedUser,
        session: &ExamSessionRecord,
        test: &TestRecord,
    ) -> ServiceResult<()> {
        if session.student_id == actor.id
            || actor.role == Role::Admin
            || test.educator_id == actor.id
        {
            Ok(())
        } else {
            Err(ServiceError::not_found("exam session"))
        }
    }

    fn ensure_owner(actor: &AuthenticatedUser, session: &ExamSessionRecord) -> ServiceResult<()> {
        if session.student_id == actor.id {
            Ok(())
        } else {
            Err(ServiceError::not_found("exam session"))
        }
    }

    fn keys(questions: &[QuestionRecord]) -> Vec<(QuestionId, AnswerKey)> {
        questions.iter().map(|q| (q.id, q.key.clone())).collect()
    }

    /// Grades and closes an in-progress session at `now`. If another
    /// request closed it first, the stored outcome is returned.
    async fn finalize(
        &self,
        session: ExamSessionRecord,
        test: &TestRecord,
        questions: &[QuestionRecord],
        now: NaiveDateTime,
    ) -> ServiceResult<ExamSessionRecord> {
        let clock = SessionClock::new(session.start_time, test.duration_minutes);
        let (status, end_time) = clock.finish(now);
        let report = grade(&Self::keys(questions), &session.answers);

        let closed = self
            .sessions
            .finish(
                session.id,
                FinishedSession {
                    status,
                    end_time,
                    score: report.score,
                    closed_at: now,
                },
            )
            .await?;

        if closed {
            info!(
                session_id = %session.id,
                status = status.as_str(),
                score = report.score,
                "exam session finished"
            );
            // the session is already closed; a streak failure must not undo that
            if let Err(err) = self
                .streaks
                .record_activity_on(session.student_id, end_time.date())
                .await
            {
                warn!(session_id = %session.id, error = %err, "failed to record streak activity");
            }
        }

        self.session(session.id).await
    }

    /// Closes the session if its deadline passed while nobody was looking.
    async fn settle(
        &self,
        session: ExamSessionRecord,
        test: &TestRecord,
        questions: &[QuestionRecord],
        now: NaiveDateTime,
    ) -> ServiceResult<ExamSessionRecord> {
        let clock = SessionClock::new(session.start_time, test.duration_minutes);
        if session.status == SessionStatus::InProgress && clock.is_expired(now) {
            self.finalize(session, test, questions, now).await
        } else {
            Ok(session)
        }
    }

    fn view(
        session: ExamSessionRecord,
        test: TestRecord,
        questions: Vec<QuestionRecord>,
        now: NaiveDateTime,
    ) -> SessionView {
        let clock = SessionClock::new(session.start_time, test.duration_minutes);
        SessionView {
            session,
            test,
            questions,
            clock,
            now,
        }
    }

    #[tracing::instrument(skip(self), fields(student_id = %actor.id))]
    pub async fn start(&self, actor: &AuthenticatedUser, test_id: TestId) -> ServiceResult<SessionView> {
        let test = self.test(test_id).await?;
        match test.status {
            TestStatus::Published => {}
            TestStatus::Draft => return Err(ServiceError::not_found("test")),
            TestStatus::Archived => {
                return Err(ServiceError::Conflict(
                    "test is archived and cannot be started".to_string(),
                ));
            }
        }

        let questions = self.tests.list_questions(test_id).await?;
        let now = self.clock.now();
        let prior = self.sessions.list_attempts(test_id, actor.id).await?;
        let attempts: Vec<PriorAttempt> = prior
            .iter()
            .map(|s| PriorAttempt {
                id: s.id,
                status: s.status,
                clock: SessionClock::new(s.start_time, test.duration_minutes),
            })
            .collect();

        let plan = plan_start(&attempts, test.allow_retake, now);
        for expired_id in &plan.expired {
            if let Some(expired) = prior.iter().find(|s| s.id == *expired_id) {
                self.finalize(expired.clone(), &test, &questions, now).await?;
            }
        }

        let session = match plan.decision {
            StartDecision::Resume(session_id) => {
                info!(%session_id, "resuming exam session");
                self.session(session_id).await?
            }
            StartDecision::RetakeNotAllowed => {
                return Err(ServiceError::Conflict(
                    "this test does not allow retakes".to_string(),
                ));
            }
            StartDecision::Begin => {
                let outcome = self
                    .sessions
                    .create_if_idle(NewExamSession {
                        test_id,
                        student_id: actor.id,
                        start_time: now,
                    })
                    .await?;
                match outcome {
                    CreateOutcome::Created(session) => {
                        info!(
                            session_id = %session.id,
                            is_first_attempt = session.is_first_attempt,
                            "exam session started"
                        );
                        session
                    }
                    CreateOutcome::AlreadyActive(session) => session,
                }
            }
        };

        Ok(Self::view(session, test, questions, now))
    }

    pub async fn get_session(
        &self,
        actor: &AuthenticatedUser,
        session_id: ExamSessionId,
    ) -> ServiceResult<SessionView> {
        let session = self.session(session_id).await?;
        let test = self.test(session.test_id).await?;
        Self::ensure_can_view(actor, &session, &test)?;

        let questions = self.tests.list_questions(test.id).await?;
        let now = self.clock.now();
        let session = self.settle(session, &test, &questions, now).await?;
        Ok(Self::view(session, test, questions, now))
    }

    /// Replaces the stored answers and review marks of an in-progress
    /// session.
    #[tracing::instrument(skip(self, request), fields(student_id = %actor.id))]
    pub async fn save_answers(
        &self,
        actor: &AuthenticatedUser,
        session_id: ExamSessionId,
        request: SaveAnswersRequest,
    ) -> ServiceResult<SessionView> {
        let session = self.session(session_id).await?;
        Self::ensure_owner(actor, &session)?;
        if session.status.is_finished() {
            return Err(ServiceError::Conflict(
                "exam session is already finished".to_string(),
            ));
        }

        let test = self.test(session.test_id).await?;
        let questions = self.tests.list_questions(test.id).await?;
        let now = self.clock.now();

        let session = self.settle(session, &test, &questions, now).await?;
        if session.status.is_finished() {
            return Err(ServiceError::Conflict(
                "time is up; the exam session was closed".to_string(),
            ));
        }

        let known: HashSet<QuestionId> = questions.iter().map(|q| q.id).collect();
        let check = |raw: &str| -> ServiceResult<QuestionId> {
            let id: QuestionId = parse_id("question id", raw)?;
            if known.contains(&id) {
                Ok(id)
            } else {
                Err(ServiceError::Validation(format!(
                    "question '{raw}' is not part of this test"
                )))
            }
        };

        let mut answers = AnswerSheet::new();
        for (raw_id, input) in request.answers {
            answers.insert(check(&raw_id)?, input.into_vec());
        }
        let mut marked = Vec::new();
        for raw_id in &request.marked_for_review {
            let id = check(raw_id)?;
            if !marked.contains(&id) {
                marked.push(id);
            }
        }

        if !self
            .sessions
            .save_answers(session_id, &answers, &marked, now)
            .await?
        {
            return Err(ServiceError::Conflict(
                "exam session is already finished".to_string(),
            ));
        }

        let session = self.session(session_id).await?;
        Ok(Self::view(session, test, questions, now))
    }

    #[tracing::instrument(skip(self), fields(student_id = %actor.id))]
    pub async fn submit(
        &self,
        actor: &AuthenticatedUser,
        session_id: ExamSessionId,
    ) -> ServiceResult<ExamResult> {
        let session = self.session(session_id).await?;
        Self::ensure_owner(actor, &session)?;
        if session.status.is_finished() {
            return Err(ServiceError::Conflict(
                "exam session is already finished".to_string(),
            ));
        }

        let test = self.test(session.test_id).await?;
        let questions = self.tests.list_questions(test.id).await?;
        let session = self
            .finalize(session, &test, &questions, self.clock.now())
            .await?;

        Self::result_of(session, test, questions)
    }

    pub async fn result(
        &self,
        actor: &AuthenticatedUser,
        session_id: ExamSessionId,
    ) -> ServiceResult<ExamResult> {
        let session = self.session(session_id).await?;
        let test = self.test(session.test_id).await?;
        Self::ensure_can_view(actor, &session, &test)?;

        let questions = self.tests.list_questions(test.id).await?;
        let session = self
            .settle(session, &test, &questions, self.clock.now())
            .await?;
        if !session.status.is_finished() {
            return Err(ServiceError::Conflict(
                "results are available once the session is finished".to_string(),
            ));
        }

        Self::result_of(session, test, questions)
    }

    fn result_of(
        session: ExamSessionRecord,
        test: TestRecord,
        questions: Vec<QuestionRecord>,
    ) -> ServiceResult<ExamResult> {
        let end_time = session.end_time.ok_or_else(|| {
            ServiceError::Internal(anyhow::anyhow!(
                "finished exam session {} has no end time",
                session.id
            ))
        })?;
        let report = grade(&Self::keys(&questions), &session.answers);

        Ok(ExamResult {
            session,
            test,
            questions,
            report,
            end_time,
        })
    }

    pub async fn list_sessions(
        &self,
        actor: &AuthenticatedUser,
    ) -> ServiceResult<Vec<(ExamSessionRecord, String)>> {
        Ok(self.sessions.list_by_student(actor.id).await?)
    }

    /// Ranked finished first attempts of a published or archived test.
    pub async fn leaderboard(
        &self,
        test_id: TestId,
        limit: usize,
    ) -> ServiceResult<Vec<Ranked<LeaderboardRow>>> {
        let test = self.test(test_id).await?;
        if test.status == TestStatus::Draft {
            return Err(ServiceError::not_found("test"));
        }

        let candidates = self
            .sessions
            .first_attempts(test_id)
            .await?
            .into_iter()
            .filter_map(|(session, username)| {
                Some(LeaderboardCandidate {
                    status: session.status,
                    is_first_attempt: session.is_first_attempt,
                    score: session.score?,
                    start_time: session.start_time,
                    end_time: session.end_time?,
                    item: LeaderboardRow {
                        student_id: session.student_id,
                        username,
                    },
                })
            })
            .collect();

        Ok(rank(candidates, limit))
    }
}
