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
                    .table(Streak::Table)
                    .if_not_exists()
                    .col(string_len(Streak::UserId, 36).primary_key())
                    .col(integer(Streak::CurrentStreak).default(0))
                    .col(integer(Streak::LongestStreak).default(0))
                    .col(date_null(Streak::LastActivityDate))
                    .col(integer(Streak::TotalActiveDays).default(0))
                    .col(boolean(Streak::FreezeUsed).default(false))
                    .col(timestamp(Streak::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-streaks-user_id")
                            .from(Streak::Table, Streak::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Badge::Table)
                    .if_not_exists()
                    .col(string_len(Badge::Id, 36).primary_key())
                    .col(string_len(Badge::Name, 100).unique_key())
                    .col(text(Badge::Description))
                    // BadgeMetric enum is represented in app code.
                    // 0=streak, 1=active_days
                    .col(
                        small_integer(Badge::Metric)
                            .check(Expr::col(Badge::Metric).gte(0))
                            .check(Expr::col(Badge::Metric).lte(1)),
                    )
                    .col(
                        integer(Badge::MilestoneDays)
                            .check(Expr::col(Badge::MilestoneDays).gt(0)),
                    )
                    .col(timestamp(Badge::CreatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserBadge::Table)
                    .if_not_exists()
                    .col(string_len(UserBadge::UserId, 36))
                    .col(string_len(UserBadge::BadgeId, 36))
                    .col(timestamp(UserBadge::EarnedAt).default(Expr::current_timestamp()))
                    .col(boolean(UserBadge::IsNew).default(true))
                    .primary_key(
                        Index::create()
                            .col(UserBadge::UserId)
                            .col(UserBadge::BadgeId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_badges-user_id")
                            .from(UserBadge::Table, UserBadge::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_badges-badge_id")
                            .from(UserBadge::Table, UserBadge::BadgeId)
                            .to(Badge::Table, Badge::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserBadge::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Badge::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Streak::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Streak {
    Table,
    UserId,
    CurrentStreak,
    LongestStreak,
    LastActivityDate,
    TotalActiveDays,
    FreezeUsed,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Badge {
    Table,
    Id,
    Name,
    Description,
    Metric,
    MilestoneDays,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserBadge {
    Table,
    UserId,
    BadgeId,
    EarnedAt,
    IsNew,
}
