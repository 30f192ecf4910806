use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::{BadgeId, DomainError, Streak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeMetric {
    /// Compared against the current streak.
    Streak,
    /// Compared against the total number of active days.
    ActiveDays,
}

impl BadgeMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            BadgeMetric::Streak => "streak",
            BadgeMetric::ActiveDays => "active_days",
        }
    }

    fn value_of(self, streak: &Streak) -> i32 {
        match self {
            BadgeMetric::Streak => streak.current_streak,
            BadgeMetric::ActiveDays => streak.total_active_days,
        }
    }
}

impl fmt::Display for BadgeMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BadgeMetric {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "streak" => Ok(BadgeMetric::Streak),
            "active_days" => Ok(BadgeMetric::ActiveDays),
            other => Err(DomainError::UnknownBadgeMetric(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    pub badge_id: BadgeId,
    pub metric: BadgeMetric,
    pub milestone_days: i32,
}

impl Milestone {
    pub fn new(badge_id: BadgeId, metric: BadgeMetric, milestone_days: i32) -> Result<Self, DomainError> {
        if milestone_days < 1 {
            return Err(DomainError::InvalidMilestone(milestone_days));
        }
        Ok(Self {
            badge_id,
            metric,
            milestone_days,
        })
    }

    pub fn is_reached(&self, streak: &Streak) -> bool {
        self.metric.value_of(streak) >= self.milestone_days
    }
}

/// Badges whose milestone is reached and that the user does not hold yet,
/// in ascending milestone order.
pub fn newly_earned(
    milestones: &[Milestone],
    streak: &Streak,
    already_earned: &HashSet<BadgeId>,
) -> Vec<BadgeId> {
    let mut reached: Vec<&Milestone> = milestones
        .iter()
        .filter(|m| m.is_reached(streak) && !already_earned.contains(&m.badge_id))
        .collect();
    reached.sort_by_key(|m| m.milestone_days);
    reached.into_iter().map(|m| m.badge_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streak(current: i32, total: i32) -> Streak {
        Streak {
            current_streak: current,
            longest_streak: current,
            last_activity_date: None,
            total_active_days: total,
            freeze_used: false,
        }
    }

    #[test]
    fn milestone_must_be_positive() {
        assert!(Milestone::new(BadgeId::new(), BadgeMetric::Streak, 0).is_err());
    }

    #[test]
    fn reached_milestones_are_awarded_in_order() {
        let week = Milestone::new(BadgeId::new(), BadgeMetric::Streak, 7).expect("valid");
        let three = Milestone::new(BadgeId::new(), BadgeMetric::Streak, 3).expect("valid");
        let month = Milestone::new(BadgeId::new(), BadgeMetric::Streak, 30).expect("valid");

        let earned = newly_earned(&[week, three, month], &streak(7, 7), &HashSet::new());

        assert_eq!(earned, vec![three.badge_id, week.badge_id]);
    }

    #[test]
    fn held_badges_are_not_awarded_again() {
        let three = Milestone::new(BadgeId::new(), BadgeMetric::Streak, 3).expect("valid");
        let held: HashSet<BadgeId> = [three.badge_id].into_iter().collect();

        assert!(newly_earned(&[three], &streak(5, 5), &held).is_empty());
    }

    #[test]
    fn active_day_badges_use_the_total() {
        let ten = Milestone::new(BadgeId::new(), BadgeMetric::ActiveDays, 10).expect("valid");

        assert!(newly_earned(&[ten], &streak(1, 9), &HashSet::new()).is_empty());
        assert_eq!(
            newly_earned(&[ten], &streak(1, 10), &HashSet::new()),
            vec![ten.badge_id]
        );
    }
}
