use chrono::NaiveDate;

/// Per-user activity counters. Days are UTC calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Streak {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_activity_date: Option<NaiveDate>,
    pub total_active_days: i32,
    /// One missed day per streak run can be bridged; cleared on reset.
    pub freeze_used: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityOutcome {
    /// Activity was already counted for this day.
    AlreadyRecorded,
    Started,
    Extended,
    /// One missed day was bridged with the freeze.
    Frozen,
    Reset,
}

impl ActivityOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityOutcome::AlreadyRecorded => "already_recorded",
            ActivityOutcome::Started => "started",
            ActivityOutcome::Extended => "extended",
            ActivityOutcome::Frozen => "frozen",
            ActivityOutcome::Reset => "reset",
        }
    }

    pub fn changed(self) -> bool {
        self != ActivityOutcome::AlreadyRecorded
    }
}

impl Streak {
    pub fn record_activity(&mut self, today: NaiveDate) -> ActivityOutcome {
        let outcome = match self.last_activity_date {
            None => {
                self.current_streak = 1;
                ActivityOutcome::Started
            }
            Some(last) => match (today - last).num_days() {
                days if days <= 0 => return ActivityOutcome::AlreadyRecorded,
                1 => {
                    self.current_streak += 1;
                    ActivityOutcome::Extended
                }
                2 if !self.freeze_used => {
                    self.freeze_used = true;
                    self.current_streak += 1;
                    ActivityOutcome::Frozen
                }
                _ => {
                    self.current_streak = 1;
                    self.freeze_used = false;
                    ActivityOutcome::Reset
                }
            },
        };

        self.last_activity_date = Some(today);
        self.total_active_days += 1;
        self.longest_streak = self.longest_streak.max(self.current_streak);
        outcome
    }

    /// The streak as it should be shown on `today`, accounting for days
    /// missed since the last recorded activity.
    pub fn current_as_of(&self, today: NaiveDate) -> i32 {
        let Some(last) = self.last_activity_date else {
            return 0;
        };

        match (today - last).num_days() {
            days if days <= 1 => self.current_streak,
            2 if !self.freeze_used => self.current_streak,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).expect("valid date")
    }

    #[test]
    fn first_activity_starts_a_streak() {
        let mut streak = Streak::default();

        assert_eq!(streak.record_activity(day(1)), ActivityOutcome::Started);
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 1);
        assert_eq!(streak.total_active_days, 1);
    }

    #[test]
    fn same_day_activity_changes_nothing() {
        let mut streak = Streak::default();
        streak.record_activity(day(1));
        let before = streak;

        assert_eq!(streak.record_activity(day(1)), ActivityOutcome::AlreadyRecorded);
        assert_eq!(streak, before);
    }

    #[test]
    fn consecutive_days_extend_the_streak() {
        let mut streak = Streak::default();
        for d in 1..=4 {
            streak.record_activity(day(d));
        }

        assert_eq!(streak.current_streak, 4);
        assert_eq!(streak.longest_streak, 4);
        assert_eq!(streak.total_active_days, 4);
    }

    #[test]
    fn single_missed_day_uses_the_freeze_once() {
        let mut streak = Streak::default();
        streak.record_activity(day(1));
        streak.record_activity(day(2));

        assert_eq!(streak.record_activity(day(4)), ActivityOutcome::Frozen);
        assert_eq!(streak.current_streak, 3);
        assert!(streak.freeze_used);

        assert_eq!(streak.record_activity(day(6)), ActivityOutcome::Reset);
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 3);
        assert!(!streak.freeze_used);
    }

    #[test]
    fn long_gap_resets_to_one() {
        let mut streak = Streak::default();
        streak.record_activity(day(1));
        streak.record_activity(day(2));

        assert_eq!(streak.record_activity(day(10)), ActivityOutcome::Reset);
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 2);
        assert_eq!(streak.total_active_days, 3);
    }

    #[test]
    fn displayed_streak_drops_after_missed_days() {
        let mut streak = Streak::default();
        streak.record_activity(day(1));
        streak.record_activity(day(2));

        assert_eq!(streak.current_as_of(day(3)), 2);
        assert_eq!(streak.current_as_of(day(4)), 2);
        assert_eq!(streak.current_as_of(day(5)), 0);
        assert_eq!(Streak::default().current_as_of(day(5)), 0);
    }
}
