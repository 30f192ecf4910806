use sea_orm_migration::prelude::*;

use crate::m20260301_000005_create_streaks::Badge;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (id, name, description, metric code, milestone days)
const DEFAULT_BADGES: [(&str, &str, &str, i16, i32); 6] = [
    (
        "6f1c2b1e-3d4a-4c5b-9e6f-000000000003",
        "Warming Up",
        "Learn three days in a row",
        0,
        3,
    ),
    (
        "6f1c2b1e-3d4a-4c5b-9e6f-000000000007",
        "Week Warrior",
        "Learn seven days in a row",
        0,
        7,
    ),
    (
        "6f1c2b1e-3d4a-4c5b-9e6f-000000000030",
        "Monthly Master",
        "Learn thirty days in a row",
        0,
        30,
    ),
    (
        "6f1c2b1e-3d4a-4c5b-9e6f-000000010010",
        "Regular",
        "Be active on ten different days",
        1,
        10,
    ),
    (
        "6f1c2b1e-3d4a-4c5b-9e6f-000000010050",
        "Dedicated",
        "Be active on fifty different days",
        1,
        50,
    ),
    (
        "6f1c2b1e-3d4a-4c5b-9e6f-000000010100",
        "Centurion",
        "Be active on one hundred different days",
        1,
        100,
    ),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert();
        insert.into_table(Badge::Table).columns([
            Badge::Id,
            Badge::Name,
            Badge::Description,
            Badge::Metric,
            Badge::MilestoneDays,
        ]);

        for (id, name, description, metric, milestone_days) in DEFAULT_BADGES {
            insert.values_panic([
                id.into(),
                name.into(),
                description.into(),
                metric.into(),
                milestone_days.into(),
            ]);
        }

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(Badge::Table)
            .and_where(Expr::col(Badge::Id).is_in(DEFAULT_BADGES.map(|(id, ..)| id)))
            .to_owned();

        manager.exec_stmt(delete).await
    }
}
