use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// At most one in-progress (status 0) session per student and test.
const CREATE_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS idx_exam_sessions_one_in_progress \
     ON exam_session (student_id, test_id) WHERE status = 0";

const DROP_INDEX: &str = "DROP INDEX IF EXISTS idx_exam_sessions_one_in_progress";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(CREATE_INDEX).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(DROP_INDEX).await?;
        Ok(())
    }
}
