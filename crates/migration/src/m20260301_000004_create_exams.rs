use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

use crate::m20260301_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Test::Table)
                    .if_not_exists()
                    .col(string_len(Test::Id, 36).primary_key())
                    .col(string_len(Test::EducatorId, 36))
                    .col(string_len(Test::Name, 200))
                    .col(string_len(Test::Subject, 100))
                    .col(
                        integer(Test::DurationMinutes)
                            .check(Expr::col(Test::DurationMinutes).gt(0)),
                    )
                    .col(double(Test::TotalMarks).default(0.0))
                    .col(integer(Test::NumQuestions).default(0))
                    // TestStatus enum is represented in app code.
                    // 0=draft, 1=published, 2=archived
                    .col(
                        small_integer(Test::Status)
                            .default(0)
                            .check(Expr::col(Test::Status).gte(0))
                            .check(Expr::col(Test::Status).lte(2)),
                    )
                    .col(boolean(Test::AllowRetake).default(false))
                    .col(timestamp(Test::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp(Test::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tests-educator_id")
                            .from(Test::Table, Test::EducatorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tests_status")
                    .table(Test::Table)
                    .col(Test::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Question::Table)
                    .if_not_exists()
                    .col(string_len(Question::Id, 36).primary_key())
                    .col(string_len(Question::TestId, 36))
                    .col(integer(Question::Position))
                    .col(text(Question::QuestionText))
                    // QuestionKind enum is represented in app code.
                    // 0=mcq, 1=multiple_correct, 2=true_false, 3=numerical
                    .col(
                        small_integer(Question::QuestionType)
                            .check(Expr::col(Question::QuestionType).gte(0))
                            .check(Expr::col(Question::QuestionType).lte(3)),
                    )
                    // JSON-encoded string arrays.
                    .col(text(Question::Options))
                    .col(text(Question::CorrectAnswers))
                    .col(double(Question::Marks))
                    .col(double(Question::NegativeMarks).default(0.0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-questions-test_id")
                            .from(Question::Table, Question::TestId)
                            .to(Test::Table, Test::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_questions_test_id")
                    .table(Question::Table)
                    .col(Question::TestId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExamSession::Table)
                    .if_not_exists()
                    .col(string_len(ExamSession::Id, 36).primary_key())
                    .col(string_len(ExamSession::TestId, 36))
                    .col(string_len(ExamSession::StudentId, 36))
                    // SessionStatus enum is represented in app code.
                    // 0=in_progress, 1=submitted, 2=completed
                    .col(
                        small_integer(ExamSession::Status)
                            .default(0)
                            .check(Expr::col(ExamSession::Status).gte(0))
                            .check(Expr::col(ExamSession::Status).lte(2)),
                    )
                    // JSON-encoded: {question_id: [answer, ...]} and [question_id, ...]
                    .col(text(ExamSession::Answers))
                    .col(text(ExamSession::MarkedForReview))
                    .col(timestamp(ExamSession::StartTime))
                    .col(timestamp_null(ExamSession::EndTime))
                    .col(double_null(ExamSession::Score))
                    .col(boolean(ExamSession::IsFirstAttempt).default(false))
                    .col(timestamp(ExamSession::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp(ExamSession::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-exam_sessions-test_id")
                            .from(ExamSession::Table, ExamSession::TestId)
                            .to(Test::Table, Test::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-exam_sessions-student_id")
                            .from(ExamSession::Table, ExamSession::StudentId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_exam_sessions_student_id_test_id")
                    .table(ExamSession::Table)
                    .col(ExamSession::StudentId)
                    .col(ExamSession::TestId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_exam_sessions_test_id_first_attempt")
                    .table(ExamSession::Table)
                    .col(ExamSession::TestId)
                    .col(ExamSession::IsFirstAttempt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExamSession::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Question::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Test::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Test {
    Table,
    Id,
    EducatorId,
    Name,
    Subject,
    DurationMinutes,
    TotalMarks,
    NumQuestions,
    Status,
    AllowRetake,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Question {
    Table,
    Id,
    TestId,
    Position,
    QuestionText,
    QuestionType,
    Options,
    CorrectAnswers,
    Marks,
    NegativeMarks,
}

#[derive(DeriveIden)]
enum ExamSession {
    Table,
    Id,
    TestId,
    StudentId,
    Status,
    Answers,
    MarkedForReview,
    StartTime,
    EndTime,
    Score,
    IsFirstAttempt,
    CreatedAt,
    UpdatedAt,
}
