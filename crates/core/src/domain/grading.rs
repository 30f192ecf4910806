use std::collections::{BTreeMap, BTreeSet};

use super::{AnswerKey, QuestionId, QuestionKind};

/// Selected answers per question. A numerical or single-choice answer is a
/// one-element list.
pub type AnswerSheet = BTreeMap<QuestionId, Vec<String>>;

pub const NUMERICAL_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Correct,
    Incorrect,
    Unanswered,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Correct => "correct",
            Verdict::Incorrect => "incorrect",
            Verdict::Unanswered => "unanswered",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionGrade {
    pub question_id: QuestionId,
    pub verdict: Verdict,
    pub awarded: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GradeReport {
    pub grades: Vec<QuestionGrade>,
    pub score: f64,
    pub correct: u32,
    pub incorrect: u32,
    pub unanswered: u32,
}

impl GradeReport {
    pub fn grade_for(&self, question_id: QuestionId) -> Option<&QuestionGrade> {
        self.grades.iter().find(|g| g.question_id == question_id)
    }
}

pub fn judge(key: &AnswerKey, selected: &[String]) -> Verdict {
    let selected: Vec<&str> = selected
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if selected.is_empty() {
        return Verdict::Unanswered;
    }

    let correct = match key.kind {
        QuestionKind::Mcq | QuestionKind::TrueFalse => {
            selected.len() == 1 && key.correct_answers.first().map(String::as_str) == Some(selected[0])
        }
        QuestionKind::MultipleCorrect => {
            let chosen: BTreeSet<&str> = selected.iter().copied().collect();
            let expected: BTreeSet<&str> = key.correct_answers.iter().map(String::as_str).collect();
            chosen == expected
        }
        QuestionKind::Numerical => {
            let expected = key
                .correct_answers
                .first()
                .and_then(|a| a.parse::<f64>().ok());
            match (selected.as_slice(), expected) {
                ([value], Some(expected)) => value
                    .parse::<f64>()
                    .is_ok_and(|v| (v - expected).abs() <= NUMERICAL_TOLERANCE),
                _ => false,
            }
        }
    };

    if correct {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    }
}

/// Grades every question of a test against the sheet. Questions missing
/// from the sheet count as unanswered; sheet entries for unknown questions
/// are ignored.
pub fn grade(questions: &[(QuestionId, AnswerKey)], answers: &AnswerSheet) -> GradeReport {
    let mut report = GradeReport::default();
    let mut total = 0.0;

    for (question_id, key) in questions {
        let verdict = answers
            .get(question_id)
            .map_or(Verdict::Unanswered, |selected| judge(key, selected));

        let awarded = match verdict {
            Verdict::Correct => {
                report.correct += 1;
                key.marks
            }
            Verdict::Incorrect => {
                report.incorrect += 1;
                -key.negative_marks
            }
            Verdict::Unanswered => {
                report.unanswered += 1;
                0.0
            }
        };

        total += awarded;
        report.grades.push(QuestionGrade {
            question_id: *question_id,
            verdict,
            awarded,
        });
    }

    report.score = round_marks(total);
    report
}

/// Rounds to two decimals so fractional negative marks sum cleanly.
pub fn round_marks(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn mcq() -> AnswerKey {
        AnswerKey::new(
            QuestionKind::Mcq,
            strings(&["Paris", "Rome", "Madrid"]),
            strings(&["Paris"]),
            4.0,
            1.0,
        )
        .expect("valid mcq")
    }

    fn multi() -> AnswerKey {
        AnswerKey::new(
            QuestionKind::MultipleCorrect,
            strings(&["2", "3", "4", "5"]),
            strings(&["2", "3", "5"]),
            3.0,
            0.5,
        )
        .expect("valid multiple correct")
    }

    fn numerical() -> AnswerKey {
        AnswerKey::new(QuestionKind::Numerical, vec![], strings(&["9.81"]), 2.0, 0.0)
            .expect("valid numerical")
    }

    #[test]
    fn blank_selection_is_unanswered() {
        assert_eq!(judge(&mcq(), &strings(&["  "])), Verdict::Unanswered);
        assert_eq!(judge(&mcq(), &[]), Verdict::Unanswered);
    }

    #[test]
    fn multiple_correct_requires_the_exact_set() {
        assert_eq!(judge(&multi(), &strings(&["5", "2", "3"])), Verdict::Correct);
        assert_eq!(judge(&multi(), &strings(&["2", "3"])), Verdict::Incorrect);
        assert_eq!(judge(&multi(), &strings(&["2", "3", "4", "5"])), Verdict::Incorrect);
    }

    #[test]
    fn numerical_answers_compare_as_numbers() {
        assert_eq!(judge(&numerical(), &strings(&["9.810"])), Verdict::Correct);
        assert_eq!(judge(&numerical(), &strings(&["9.8"])), Verdict::Incorrect);
        assert_eq!(judge(&numerical(), &strings(&["g"])), Verdict::Incorrect);
    }

    #[test]
    fn mcq_with_two_selections_is_wrong() {
        assert_eq!(judge(&mcq(), &strings(&["Paris", "Rome"])), Verdict::Incorrect);
    }

    #[test]
    fn grade_applies_marks_and_negative_marks() {
        let q1 = QuestionId::new();
        let q2 = QuestionId::new();
        let q3 = QuestionId::new();
        let questions = vec![(q1, mcq()), (q2, multi()), (q3, numerical())];

        let mut answers = AnswerSheet::new();
        answers.insert(q1, strings(&["Paris"]));
        answers.insert(q2, strings(&["2"]));
        answers.insert(QuestionId::new(), strings(&["ignored"]));

        let report = grade(&questions, &answers);

        assert_eq!(report.score, 3.5);
        assert_eq!(report.correct, 1);
        assert_eq!(report.incorrect, 1);
        assert_eq!(report.unanswered, 1);
        assert_eq!(report.grade_for(q2).map(|g| g.awarded), Some(-0.5));
        assert_eq!(
            report.grade_for(q3).map(|g| g.verdict),
            Some(Verdict::Unanswered)
        );
    }

    #[test]
    fn score_can_go_negative() {
        let q1 = QuestionId::new();
        let mut answers = AnswerSheet::new();
        answers.insert(q1, strings(&["Rome"]));

        let report = grade(&[(q1, mcq())], &answers);

        assert_eq!(report.score, -1.0);
    }
}
