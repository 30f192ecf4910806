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
                    .table(Course::Table)
                    .if_not_exists()
                    .col(string_len(Course::Id, 36).primary_key())
                    .col(string_len(Course::EducatorId, 36))
                    .col(string_len(Course::Title, 200))
                    .col(text(Course::Description))
                    .col(
                        big_integer(Course::PriceCents)
                            .default(0)
                            .check(Expr::col(Course::PriceCents).gte(0)),
                    )
                    .col(boolean(Course::Published).default(false))
                    .col(timestamp(Course::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp(Course::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-courses-educator_id")
                            .from(Course::Table, Course::EducatorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_courses_educator_id")
                    .table(Course::Table)
                    .col(Course::EducatorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bundle::Table)
                    .if_not_exists()
                    .col(string_len(Bundle::Id, 36).primary_key())
                    .col(string_len(Bundle::EducatorId, 36))
                    .col(string_len(Bundle::Title, 200))
                    .col(text(Bundle::Description))
                    .col(
                        big_integer(Bundle::PriceCents)
                            .default(0)
                            .check(Expr::col(Bundle::PriceCents).gte(0)),
                    )
                    .col(timestamp(Bundle::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp(Bundle::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bundles-educator_id")
                            .from(Bundle::Table, Bundle::EducatorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BundleCourse::Table)
                    .if_not_exists()
                    .col(string_len(BundleCourse::BundleId, 36))
                    .col(string_len(BundleCourse::CourseId, 36))
                    .primary_key(
                        Index::create()
                            .col(BundleCourse::BundleId)
                            .col(BundleCourse::CourseId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bundle_courses-bundle_id")
                            .from(BundleCourse::Table, BundleCourse::BundleId)
                            .to(Bundle::Table, Bundle::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bundle_courses-course_id")
                            .from(BundleCourse::Table, BundleCourse::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Review::Table)
                    .if_not_exists()
                    .col(string_len(Review::Id, 36).primary_key())
                    .col(string_len(Review::CourseId, 36))
                    .col(string_len(Review::UserId, 36))
                    .col(
                        small_integer(Review::Rating)
                            .check(Expr::col(Review::Rating).gte(1))
                            .check(Expr::col(Review::Rating).lte(5)),
                    )
                    .col(text(Review::Comment))
                    .col(timestamp(Review::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp(Review::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reviews-course_id")
                            .from(Review::Table, Review::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reviews-user_id")
                            .from(Review::Table, Review::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // one review per student and course
        manager
            .create_index(
                Index::create()
                    .name("idx_reviews_course_id_user_id")
                    .table(Review::Table)
                    .col(Review::CourseId)
                    .col(Review::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Announcement::Table)
                    .if_not_exists()
                    .col(string_len(Announcement::Id, 36).primary_key())
                    .col(string_len(Announcement::CourseId, 36))
                    .col(string_len(Announcement::Title, 200))
                    .col(text(Announcement::Body))
                    .col(timestamp(Announcement::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-announcements-course_id")
                            .from(Announcement::Table, Announcement::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Faq::Table)
                    .if_not_exists()
                    .col(string_len(Faq::Id, 36).primary_key())
                    .col(string_len(Faq::CourseId, 36))
                    .col(text(Faq::Question))
                    .col(text(Faq::Answer))
                    .col(integer(Faq::Position).default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-faqs-course_id")
                            .from(Faq::Table, Faq::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Faq::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Announcement::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Review::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(BundleCourse::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Bundle::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Course::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Course {
    Table,
    Id,
    EducatorId,
    Title,
    Description,
    PriceCents,
    Published,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Bundle {
    Table,
    Id,
    EducatorId,
    Title,
    Description,
    PriceCents,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BundleCourse {
    Table,
    BundleId,
    CourseId,
}

#[derive(DeriveIden)]
enum Review {
    Table,
    Id,
    CourseId,
    UserId,
    Rating,
    Comment,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Announcement {
    Table,
    Id,
    CourseId,
    Title,
    Body,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Faq {
    Table,
    Id,
    CourseId,
    Question,
    Answer,
    Position,
}
