use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

use crate::m20260301_000001_create_users::User;
use crate::m20260301_000002_create_catalog::{Bundle, Course};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CartItem::Table)
                    .if_not_exists()
                    .col(string_len(CartItem::Id, 36).primary_key())
                    .col(string_len(CartItem::UserId, 36))
                    .col(string_len_null(CartItem::CourseId, 36))
                    .col(string_len_null(CartItem::BundleId, 36))
                    .col(timestamp(CartItem::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cart_items-user_id")
                            .from(CartItem::Table, CartItem::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cart_items-course_id")
                            .from(CartItem::Table, CartItem::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cart_items-bundle_id")
                            .from(CartItem::Table, CartItem::BundleId)
                            .to(Bundle::Table, Bundle::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cart_items_user_id")
                    .table(CartItem::Table)
                    .col(CartItem::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Order::Table)
                    .if_not_exists()
                    .col(string_len(Order::Id, 36).primary_key())
                    .col(string_len(Order::UserId, 36))
                    // OrderStatus enum is represented in app code.
                    // 0=pending, 1=paid, 2=cancelled
                    .col(
                        small_integer(Order::Status)
                            .default(0)
                            .check(Expr::col(Order::Status).gte(0))
                            .check(Expr::col(Order::Status).lte(2)),
                    )
                    .col(big_integer(Order::TotalCents).default(0))
                    .col(timestamp(Order::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_null(Order::PaidAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-orders-user_id")
                            .from(Order::Table, Order::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_user_id")
                    .table(Order::Table)
                    .col(Order::UserId)
                    .to_owned(),
            )
            .await?;

        // Items copy title and price so orders survive catalog edits.
        manager
            .create_table(
                Table::create()
                    .table(OrderItem::Table)
                    .if_not_exists()
                    .col(string_len(OrderItem::Id, 36).primary_key())
                    .col(string_len(OrderItem::OrderId, 36))
                    .col(string_len_null(OrderItem::CourseId, 36))
                    .col(string_len_null(OrderItem::BundleId, 36))
                    .col(string_len(OrderItem::Title, 200))
                    .col(big_integer(OrderItem::PriceCents))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-order_items-order_id")
                            .from(OrderItem::Table, OrderItem::OrderId)
                            .to(Order::Table, Order::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Enrollment::Table)
                    .if_not_exists()
                    .col(string_len(Enrollment::UserId, 36))
                    .col(string_len(Enrollment::CourseId, 36))
                    .col(string_len(Enrollment::OrderId, 36))
                    .col(timestamp(Enrollment::CreatedAt).default(Expr::current_timestamp()))
                    .primary_key(
                        Index::create()
                            .col(Enrollment::UserId)
                            .col(Enrollment::CourseId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-enrollments-user_id")
                            .from(Enrollment::Table, Enrollment::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-enrollments-course_id")
                            .from(Enrollment::Table, Enrollment::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-enrollments-order_id")
                            .from(Enrollment::Table, Enrollment::OrderId)
                            .to(Order::Table, Order::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Enrollment::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(OrderItem::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Order::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(CartItem::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum CartItem {
    Table,
    Id,
    UserId,
    CourseId,
    BundleId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Order {
    Table,
    Id,
    UserId,
    Status,
    TotalCents,
    CreatedAt,
    PaidAt,
}

#[derive(DeriveIden)]
enum OrderItem {
    Table,
    Id,
    OrderId,
    CourseId,
    BundleId,
    Title,
    PriceCents,
}

#[derive(DeriveIden)]
enum Enrollment {
    Table,
    UserId,
    CourseId,
    OrderId,
    CreatedAt,
}
