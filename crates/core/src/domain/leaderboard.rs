use std::cmp::Ordering;

use chrono::NaiveDateTime;

use super::{SessionStatus, time_taken_seconds};

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardCandidate<T> {
    pub status: SessionStatus,
    pub is_first_attempt: bool,
    pub score: f64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub item: T,
}

impl<T> LeaderboardCandidate<T> {
    fn time_taken(&self) -> i64 {
        time_taken_seconds(self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub rank: u32,
    pub candidate: LeaderboardCandidate<T>,
}

/// Ranks finished first attempts: higher score first, then faster, then
/// earlier. Equal score and time share a rank (1, 2, 2, 4).
pub fn rank<T>(candidates: Vec<LeaderboardCandidate<T>>, limit: usize) -> Vec<Ranked<T>> {
    let mut eligible: Vec<_> = candidates
        .into_iter()
        .filter(|c| c.is_first_attempt && c.status.is_finished())
        .collect();

    eligible.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.time_taken().cmp(&b.time_taken()))
            .then_with(|| a.end_time.cmp(&b.end_time))
    });

    let mut ranked: Vec<Ranked<T>> = Vec::with_capacity(eligible.len().min(limit));
    for (position, candidate) in eligible.into_iter().take(limit).enumerate() {
        let rank = match ranked.last() {
            Some(prev)
                if prev.candidate.score == candidate.score
                    && prev.candidate.time_taken() == candidate.time_taken() =>
            {
                prev.rank
            }
            _ => position as u32 + 1,
        };
        ranked.push(Ranked { rank, candidate });
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .and_then(|d| d.and_hms_opt(10, minute, 0))
            .expect("valid timestamp")
    }

    fn candidate(name: &'static str, score: f64, taken: u32) -> LeaderboardCandidate<&'static str> {
        LeaderboardCandidate {
            status: SessionStatus::Submitted,
            is_first_attempt: true,
            score,
            start_time: at(0),
            end_time: at(taken),
            item: name,
        }
    }

    fn names(ranked: &[Ranked<&'static str>]) -> Vec<(u32, &'static str)> {
        ranked.iter().map(|r| (r.rank, r.candidate.item)).collect()
    }

    #[test]
    fn higher_score_ranks_first_and_faster_breaks_ties() {
        let ranked = rank(
            vec![
                candidate("slow", 80.0, 40),
                candidate("best", 95.0, 50),
                candidate("fast", 80.0, 20),
            ],
            10,
        );

        assert_eq!(names(&ranked), vec![(1, "best"), (2, "fast"), (3, "slow")]);
    }

    #[test]
    fn identical_results_share_a_rank() {
        let ranked = rank(
            vec![
                candidate("a", 90.0, 30),
                candidate("b", 70.0, 30),
                candidate("c", 90.0, 30),
                candidate("d", 60.0, 30),
            ],
            10,
        );

        let ranks: Vec<u32> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 1, 3, 4]);
    }

    #[test]
    fn retakes_and_running_sessions_are_excluded() {
        let mut retake = candidate("retake", 100.0, 10);
        retake.is_first_attempt = false;
        let mut running = candidate("running", 100.0, 10);
        running.status = SessionStatus::InProgress;
        let mut timed_out = candidate("timed_out", 50.0, 30);
        timed_out.status = SessionStatus::Completed;

        let ranked = rank(vec![retake, running, timed_out], 10);

        assert_eq!(names(&ranked), vec![(1, "timed_out")]);
    }

    #[test]
    fn limit_truncates_the_board() {
        let ranked = rank(
            vec![
                candidate("a", 3.0, 1),
                candidate("b", 2.0, 1),
                candidate("c", 1.0, 1),
            ],
            2,
        );

        assert_eq!(ranked.len(), 2);
    }
}
