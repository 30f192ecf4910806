use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    Mcq,
    MultipleCorrect,
    TrueFalse,
    Numerical,
}

impl QuestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Mcq => "mcq",
            QuestionKind::MultipleCorrect => "multiple_correct",
            QuestionKind::TrueFalse => "true_false",
            QuestionKind::Numerical => "numerical",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mcq" => Ok(QuestionKind::Mcq),
            "multiple_correct" => Ok(QuestionKind::MultipleCorrect),
            "true_false" => Ok(QuestionKind::TrueFalse),
            "numerical" => Ok(QuestionKind::Numerical),
            other => Err(DomainError::UnknownQuestionKind(other.to_string())),
        }
    }
}

/// The gradable part of a question.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerKey {
    pub kind: QuestionKind,
    pub options: Vec<String>,
    pub correct_answers: Vec<String>,
    pub marks: f64,
    pub negative_marks: f64,
}

impl AnswerKey {
    pub const TRUE_FALSE_OPTIONS: [&'static str; 2] = ["true", "false"];

    /// Validates and normalizes an answer key. True/false questions always
    /// get the fixed `["true", "false"]` options.
    pub fn new(
        kind: QuestionKind,
        options: Vec<String>,
        correct_answers: Vec<String>,
        marks: f64,
        negative_marks: f64,
    ) -> Result<Self, DomainError> {
        if !marks.is_finite() || marks <= 0.0 {
            return Err(DomainError::InvalidMarks(marks));
        }
        if !negative_marks.is_finite() || negative_marks < 0.0 {
            return Err(DomainError::InvalidNegativeMarks(negative_marks));
        }

        let options: Vec<String> = match kind {
            QuestionKind::TrueFalse => Self::TRUE_FALSE_OPTIONS
                .iter()
                .map(|o| o.to_string())
                .collect(),
            _ => options.into_iter().map(|o| o.trim().to_string()).collect(),
        };
        let correct_answers: Vec<String> = correct_answers
            .into_iter()
            .map(|a| a.trim().to_string())
            .collect();

        match kind {
            QuestionKind::Mcq | QuestionKind::TrueFalse => {
                if kind == QuestionKind::Mcq && options.len() < 2 {
                    return Err(invalid("mcq needs at least two options"));
                }
                check_distinct_options(&options)?;
                if correct_answers.len() != 1 {
                    return Err(invalid("exactly one correct answer is required"));
                }
                check_answers_are_options(&options, &correct_answers)?;
            }
            QuestionKind::MultipleCorrect => {
                if options.len() < 2 {
                    return Err(invalid("multiple_correct needs at least two options"));
                }
                check_distinct_options(&options)?;
                if correct_answers.is_empty() {
                    return Err(invalid("at least one correct answer is required"));
                }
                check_answers_are_options(&options, &correct_answers)?;
            }
            QuestionKind::Numerical => {
                if !options.is_empty() {
                    return Err(invalid("numerical questions take no options"));
                }
                if correct_answers.len() != 1 {
                    return Err(invalid("exactly one correct answer is required"));
                }
                if correct_answers[0].parse::<f64>().is_err() {
                    return Err(invalid("numerical answer must be a number"));
                }
            }
        }

        Ok(Self {
            kind,
            options,
            correct_answers,
            marks,
            negative_marks,
        })
    }
}

fn invalid(message: &str) -> DomainError {
    DomainError::InvalidQuestion(message.to_string())
}

fn check_distinct_options(options: &[String]) -> Result<(), DomainError> {
    let mut seen = HashSet::new();
    for option in options {
        if option.is_empty() {
            return Err(invalid("options must not be empty"));
        }
        if !seen.insert(option.as_str()) {
            return Err(DomainError::InvalidQuestion(format!(
                "duplicate option '{option}'"
            )));
        }
    }
    Ok(())
}

fn check_answers_are_options(options: &[String], answers: &[String]) -> Result<(), DomainError> {
    match answers.iter().find(|a| !options.contains(a)) {
        Some(answer) => Err(DomainError::InvalidQuestion(format!(
            "correct answer '{answer}' is not one of the options"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn mcq_answer_must_be_an_option() {
        let err = AnswerKey::new(
            QuestionKind::Mcq,
            strings(&["2", "3"]),
            strings(&["4"]),
            4.0,
            1.0,
        )
        .expect_err("answer outside options should be rejected");

        assert_eq!(
            err.to_string(),
            "invalid question: correct answer '4' is not one of the options"
        );
    }

    #[test]
    fn true_false_options_are_fixed() {
        let key = AnswerKey::new(
            QuestionKind::TrueFalse,
            strings(&["yes", "no"]),
            strings(&["false"]),
            1.0,
            0.0,
        )
        .expect("true/false key should be valid");

        assert_eq!(key.options, strings(&["true", "false"]));
    }

    #[test]
    fn multiple_correct_accepts_several_answers() {
        let key = AnswerKey::new(
            QuestionKind::MultipleCorrect,
            strings(&["a", "b", "c"]),
            strings(&[" a", "c "]),
            2.0,
            0.5,
        )
        .expect("multiple correct key should be valid");

        assert_eq!(key.correct_answers, strings(&["a", "c"]));
    }

    #[test]
    fn numerical_answer_must_parse() {
        assert!(
            AnswerKey::new(QuestionKind::Numerical, vec![], strings(&["pi"]), 1.0, 0.0).is_err()
        );
        assert!(
            AnswerKey::new(QuestionKind::Numerical, vec![], strings(&["3.14"]), 1.0, 0.0).is_ok()
        );
    }

    #[test]
    fn marks_must_be_positive() {
        let err = AnswerKey::new(
            QuestionKind::Numerical,
            vec![],
            strings(&["1"]),
            0.0,
            0.0,
        )
        .expect_err("zero marks should be rejected");

        assert_eq!(err, DomainError::InvalidMarks(0.0));
    }

    #[test]
    fn duplicate_options_are_rejected() {
        assert!(
            AnswerKey::new(
                QuestionKind::Mcq,
                strings(&["a", "a"]),
                strings(&["a"]),
                1.0,
                0.0,
            )
            .is_err()
        );
    }
}
