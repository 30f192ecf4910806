use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, TimeDelta};

use super::{DomainError, ExamSessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionStatus {
    #[default]
    InProgress,
    /// Submitted by the student before the deadline.
    Submitted,
    /// Closed because time ran out.
    Completed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Submitted => "submitted",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn is_finished(self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(SessionStatus::InProgress),
            "submitted" => Ok(SessionStatus::Submitted),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(DomainError::UnknownSessionStatus(other.to_string())),
        }
    }
}

/// Start time and time limit of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    pub start_time: NaiveDateTime,
    pub duration_minutes: i32,
}

impl SessionClock {
    pub fn new(start_time: NaiveDateTime, duration_minutes: i32) -> Self {
        Self {
            start_time,
            duration_minutes,
        }
    }

    pub fn deadline(&self) -> NaiveDateTime {
        self.start_time + TimeDelta::minutes(i64::from(self.duration_minutes))
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        now >= self.deadline()
    }

    pub fn remaining_seconds(&self, now: NaiveDateTime) -> i64 {
        (self.deadline() - now).num_seconds().max(0)
    }

    /// Terminal status and end time for a session closed at `now`.
    pub fn finish(&self, now: NaiveDateTime) -> (SessionStatus, NaiveDateTime) {
        if self.is_expired(now) {
            (SessionStatus::Completed, self.deadline())
        } else {
            (SessionStatus::Submitted, now)
        }
    }
}

pub fn time_taken_seconds(start_time: NaiveDateTime, end_time: NaiveDateTime) -> i64 {
    (end_time - start_time).num_seconds().max(0)
}

pub fn time_taken_minutes(start_time: NaiveDateTime, end_time: NaiveDateTime) -> f64 {
    let minutes = time_taken_seconds(start_time, end_time) as f64 / 60.0;
    (minutes * 100.0).round() / 100.0
}

/// What a student already has for a test when asking to start it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorAttempt {
    pub id: ExamSessionId,
    pub status: SessionStatus,
    pub clock: SessionClock,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartDecision {
    /// An unexpired in-progress session exists; hand it back.
    Resume(ExamSessionId),
    /// Nothing is running; open a new session.
    Begin,
    RetakeNotAllowed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartPlan {
    /// In-progress sessions past their deadline that must be closed first.
    pub expired: Vec<ExamSessionId>,
    pub decision: StartDecision,
}

pub fn plan_start(prior: &[PriorAttempt], allow_retake: bool, now: NaiveDateTime) -> StartPlan {
    let mut expired = Vec::new();
    let mut resumable = None;
    let mut has_finished = false;

    for attempt in prior {
        match attempt.status {
            SessionStatus::InProgress if attempt.clock.is_expired(now) => {
                expired.push(attempt.id);
                has_finished = true;
            }
            SessionStatus::InProgress => {
                resumable.get_or_insert(attempt.id);
            }
            SessionStatus::Submitted | SessionStatus::Completed => has_finished = true,
        }
    }

    let decision = match resumable {
        Some(id) => StartDecision::Resume(id),
        None if has_finished && !allow_retake => StartDecision::RetakeNotAllowed,
        None => StartDecision::Begin,
    };

    StartPlan { expired, decision }
}
