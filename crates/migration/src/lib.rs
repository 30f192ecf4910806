pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_catalog;
mod m20260301_000003_create_commerce;
mod m20260301_000004_create_exams;
mod m20260301_000005_create_streaks;
mod m20260301_000006_seed_badges;
mod m20260301_000007_unique_active_session;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_users::Migration),
            Box::new(m20260301_000002_create_catalog::Migration),
            Box::new(m20260301_000003_create_commerce::Migration),
            Box::new(m20260301_000004_create_exams::Migration),
            Box::new(m20260301_000005_create_streaks::Migration),
            Box::new(m20260301_000006_seed_badges::Migration),
            Box::new(m20260301_000007_unique_active_session::Migration),
        ]
    }
}
