use crate::entity::{badge, streak, user_badge};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use coursehub_core::domain::{BadgeId, BadgeMetric, Milestone, Streak, UserId};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::HashSet;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct BadgeRecord {
    pub id: BadgeId,
    pub name: String,
    pub description: String,
    pub metric: BadgeMetric,
    pub milestone_days: i32,
}

impl BadgeRecord {
    pub fn milestone(&self) -> Milestone {
        Milestone {
            badge_id: self.id,
            metric: self.metric,
            milestone_days: self.milestone_days,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewBadge {
    pub name: String,
    pub description: String,
    pub metric: BadgeMetric,
    pub milestone_days: i32,
}

#[derive(Debug, Clone)]
pub struct EarnedBadgeRecord {
    pub badge: BadgeRecord,
    pub earned_at: NaiveDateTime,
    pub is_new: bool,
}

#[async_trait]
pub trait StreakRepository: Send + Sync {
    async fn find(&self, user_id: UserId) -> Result<Option<Streak>>;
    async fn save(&self, user_id: UserId, streak: &Streak, saved_at: NaiveDateTime) -> Result<()>;
    async fn list_badges(&self) -> Result<Vec<BadgeRecord>>;
    async fn find_badge_by_name(&self, name: &str) -> Result<Option<BadgeRecord>>;
    async fn create_badge(&self, new_badge: NewBadge, created_at: NaiveDateTime)
    -> Result<BadgeRecord>;
    async fn delete_badge(&self, badge_id: BadgeId) -> Result<bool>;
    async fn earned_badge_ids(&self, user_id: UserId) -> Result<HashSet<BadgeId>>;
    /// Records the badges as new for the user and returns the ones actually
    /// inserted. Badges the user already holds are skipped.
    async fn award(
        &self,
        user_id: UserId,
        badge_ids: &[BadgeId],
        earned_at: NaiveDateTime,
    ) -> Result<Vec<BadgeId>>;
    async fn list_user_badges(&self, user_id: UserId) -> Result<Vec<EarnedBadgeRecord>>;
    /// Clears the new flag on every badge of the user, returning how many changed.
    async fn mark_seen(&self, user_id: UserId) -> Result<u64>;
}

#[derive(Clone)]
pub struct SeaOrmStreakRepository {
    db: DatabaseConnection,
}

impl SeaOrmStreakRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn map_metric(code: i16) -> Result<BadgeMetric> {
        match code {
            0 => Ok(BadgeMetric::Streak),
            1 => Ok(BadgeMetric::ActiveDays),
            _ => Err(anyhow!("invalid badge.metric code from database: {code}")),
        }
    }

    fn map_metric_code(metric: BadgeMetric) -> i16 {
        match metric {
            BadgeMetric::Streak => 0,
            BadgeMetric::ActiveDays => 1,
        }
    }

    fn map_streak(model: streak::Model) -> Streak {
        Streak {
            current_streak: model.current_streak,
            longest_streak: model.longest_streak,
            last_activity_date: model.last_activity_date,
            total_active_days: model.total_active_days,
            freeze_used: model.freeze_used,
        }
    }

    fn map_badge(model: badge::Model) -> Result<BadgeRecord> {
        let id = BadgeId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid badge.id '{}' from database: {e}", model.id))?;

        Ok(BadgeRecord {
            id,
            name: model.name,
            description: model.description,
            metric: Self::map_metric(model.metric)?,
            milestone_days: model.milestone_days,
        })
    }
}

#[async_trait]
impl StreakRepository for SeaOrmStreakRepository {
    async fn find(&self, user_id: UserId) -> Result<Option<Streak>> {
        let model = streak::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?;

        Ok(model.map(Self::map_streak))
    }

    async fn save(&self, user_id: UserId, streak: &Streak, saved_at: NaiveDateTime) -> Result<()> {
        let active_model = streak::ActiveModel {
            user_id: Set(user_id.to_string()),
            current_streak: Set(streak.current_streak),
            longest_streak: Set(streak.longest_streak),
            last_activity_date: Set(streak.last_activity_date),
            total_active_days: Set(streak.total_active_days),
            freeze_used: Set(streak.freeze_used),
            updated_at: Set(saved_at),
        };

        streak::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(streak::Column::UserId)
                    .update_columns([
                        streak::Column::CurrentStreak,
                        streak::Column::LongestStreak,
                        streak::Column::LastActivityDate,
                        streak::Column::TotalActiveDays,
                        streak::Column::FreezeUsed,
                        streak::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    async fn list_badges(&self) -> Result<Vec<BadgeRecord>> {
        let models = badge::Entity::find()
            .order_by_asc(badge::Column::Metric)
            .order_by_asc(badge::Column::MilestoneDays)
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::map_badge).collect()
    }

    async fn find_badge_by_name(&self, name: &str) -> Result<Option<BadgeRecord>> {
        let model = badge::Entity::find()
            .filter(badge::Column::Name.eq(name))
            .one(&self.db)
            .await?;

        model.map(Self::map_badge).transpose()
    }

    async fn create_badge(
        &self,
        new_badge: NewBadge,
        created_at: NaiveDateTime,
    ) -> Result<BadgeRecord> {
        let model = badge::ActiveModel {
            id: Set(BadgeId::new().to_string()),
            name: Set(new_badge.name),
            description: Set(new_badge.description),
            metric: Set(Self::map_metric_code(new_badge.metric)),
            milestone_days: Set(new_badge.milestone_days),
            created_at: Set(created_at),
        }
        .insert(&self.db)
        .await?;

        Self::map_badge(model)
    }

    async fn delete_badge(&self, badge_id: BadgeId) -> Result<bool> {
        let result = badge::Entity::delete_by_id(badge_id.to_string())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn earned_badge_ids(&self, user_id: UserId) -> Result<HashSet<BadgeId>> {
        let raw_ids: Vec<String> = user_badge::Entity::find()
            .select_only()
            .column(user_badge::Column::BadgeId)
            .filter(user_badge::Column::UserId.eq(user_id.to_string()))
            .into_tuple()
            .all(&self.db)
            .await?;

        raw_ids
            .iter()
            .map(|raw| {
                BadgeId::from_str(raw)
                    .map_err(|e| anyhow!("invalid user_badge.badge_id '{raw}' from database: {e}"))
            })
            .collect()
    }

    async fn award(
        &self,
        user_id: UserId,
        badge_ids: &[BadgeId],
        earned_at: NaiveDateTime,
    ) -> Result<Vec<BadgeId>> {
        let txn = self.db.begin().await?;
        let mut inserted = Vec::with_capacity(badge_ids.len());

        for badge_id in badge_ids {
            let row = user_badge::ActiveModel {
                user_id: Set(user_id.to_string()),
                badge_id: Set(badge_id.to_string()),
                earned_at: Set(earned_at),
                is_new: Set(true),
            };
            let rows = user_badge::Entity::insert(row)
                .on_conflict(
                    OnConflict::columns([user_badge::Column::UserId, user_badge::Column::BadgeId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
            if rows > 0 {
                inserted.push(*badge_id);
            }
        }

        txn.commit().await?;
        Ok(inserted)
    }

    async fn list_user_badges(&self, user_id: UserId) -> Result<Vec<EarnedBadgeRecord>> {
        let rows = user_badge::Entity::find()
            .filter(user_badge::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(user_badge::Column::EarnedAt)
            .find_also_related(badge::Entity)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|(earned, badge)| {
                let badge = badge.ok_or_else(|| {
                    anyhow!("user_badge '{}' references a missing badge", earned.badge_id)
                })?;
                Ok(EarnedBadgeRecord {
                    badge: Self::map_badge(badge)?,
                    earned_at: earned.earned_at,
                    is_new: earned.is_new,
                })
            })
            .collect()
    }

    async fn mark_seen(&self, user_id: UserId) -> Result<u64> {
        let result = user_badge::Entity::update_many()
            .col_expr(user_badge::Column::IsNew, Expr::value(false))
            .filter(user_badge::Column::UserId.eq(user_id.to_string()))
            .filter(user_badge::Column::IsNew.eq(true))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
