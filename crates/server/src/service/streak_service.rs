use crate::clock::Clock;
use crate::repository::streak_repository::{
    BadgeRecord, EarnedBadgeRecord, NewBadge, StreakRepository,
};
use crate::service::auth_service::AuthenticatedUser;
use crate::service::ensure_admin;
use crate::service::error::{ServiceError, ServiceResult};
use chrono::NaiveDate;
use coursehub_api_types::streak::CreateBadgeRequest;
use coursehub_core::domain::{
    ActivityOutcome, BadgeId, BadgeMetric, Milestone, Streak, UserId, newly_earned, required_text,
};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ActivityResult {
    pub outcome: ActivityOutcome,
    pub streak: Streak,
    pub new_badges: Vec<EarnedBadgeRecord>,
}

pub struct StreakService {
    streaks: Arc<dyn StreakRepository>,
    clock: Arc<dyn Clock>,
}

impl StreakService {
    pub fn new(streaks: Arc<dyn StreakRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { streaks, clock }
    }

    pub async fn record_activity(&self, user_id: UserId) -> ServiceResult<ActivityResult> {
        self.record_activity_on(user_id, self.clock.today()).await
    }

    /// Counts `day` as active for the user and awards every badge whose
    /// milestone is now reached.
    #[tracing::instrument(skip(self))]
    pub async fn record_activity_on(
        &self,
        user_id: UserId,
        day: NaiveDate,
    ) -> ServiceResult<ActivityResult> {
        let mut streak = self.streaks.find(user_id).await?.unwrap_or_default();
        let outcome = streak.record_activity(day);
        if outcome.changed() {
            self.streaks.save(user_id, &streak, self.clock.now()).await?;
            info!(
                outcome = outcome.as_str(),
                current_streak = streak.current_streak,
                total_active_days = streak.total_active_days,
                "activity recorded"
            );
        }

        let new_badges = self.award_badges(user_id, &streak).await?;
        Ok(ActivityResult {
            outcome,
            streak,
            new_badges,
        })
    }

    async fn award_badges(
        &self,
        user_id: UserId,
        streak: &Streak,
    ) -> ServiceResult<Vec<EarnedBadgeRecord>> {
        let badges = self.streaks.list_badges().await?;
        let milestones: Vec<Milestone> = badges.iter().map(BadgeRecord::milestone).collect();
        let held = self.streaks.earned_badge_ids(user_id).await?;

        let earned = newly_earned(&milestones, streak, &held);
        if earned.is_empty() {
            return Ok(Vec::new());
        }

        let earned_at = self.clock.now();
        // a concurrent call may have awarded some of them already
        let inserted = self.streaks.award(user_id, &earned, earned_at).await?;

        let earned_set: HashSet<BadgeId> = inserted.into_iter().collect();
        let mut awarded: Vec<EarnedBadgeRecord> = badges
            .into_iter()
            .filter(|b| earned_set.contains(&b.id))
            .map(|badge| EarnedBadgeRecord {
                badge,
                earned_at,
                is_new: true,
            })
            .collect();
        awarded.sort_by_key(|b| b.badge.milestone_days);

        if !awarded.is_empty() {
            info!(%user_id, count = awarded.len(), "badges awarded");
        }
        Ok(awarded)
    }

    /// The stored counters, with the current streak shown as it stands
    /// today.
    pub async fn streak(&self, user_id: UserId) -> ServiceResult<Streak> {
        let mut streak = self.streaks.find(user_id).await?.unwrap_or_default();
        streak.current_streak = streak.current_as_of(self.clock.today());
        Ok(streak)
    }

    pub async fn list_badges(&self) -> ServiceResult<Vec<BadgeRecord>> {
        Ok(self.streaks.list_badges().await?)
    }

    pub async fn user_badges(&self, user_id: UserId) -> ServiceResult<Vec<EarnedBadgeRecord>> {
        Ok(self.streaks.list_user_badges(user_id).await?)
    }

    pub async fn mark_badges_seen(&self, user_id: UserId) -> ServiceResult<u64> {
        Ok(self.streaks.mark_seen(user_id).await?)
    }

    #[tracing::instrument(skip(self, request), fields(actor_id = %actor.id))]
    pub async fn create_badge(
        &self,
        actor: &AuthenticatedUser,
        request: CreateBadgeRequest,
    ) -> ServiceResult<BadgeRecord> {
        ensure_admin(actor)?;

        let name = required_text("name", request.name, 100)?;
        let metric = BadgeMetric::from_str(request.metric.trim())?;
        // validates the threshold before anything is stored
        Milestone::new(BadgeId::new(), metric, request.milestone_days)?;

        if self.streaks.find_badge_by_name(&name).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "badge '{name}' already exists"
            )));
        }

        let new_badge = NewBadge {
            name,
            description: request.description.trim().to_string(),
            metric,
            milestone_days: request.milestone_days,
        };
        let badge = self
            .streaks
            .create_badge(new_badge, self.clock.now())
            .await?;

        info!(
            badge_id = %badge.id,
            metric = %badge.metric,
            milestone_days = badge.milestone_days,
            "badge created"
        );
        Ok(badge)
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn delete_badge(
        &self,
        actor: &AuthenticatedUser,
        badge_id: BadgeId,
    ) -> ServiceResult<()> {
        ensure_admin(actor)?;
        if !self.streaks.delete_badge(badge_id).await? {
            return Err(ServiceError::not_found("badge"));
        }
        Ok(())
    }
}
