use super::DomainError;

/// Trims `value` and checks it is non-empty and at most `max` characters.
pub fn required_text(
    field: &'static str,
    value: impl Into<String>,
    max: usize,
) -> Result<String, DomainError> {
    let value = value.into();
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(DomainError::EmptyField(field));
    }

    let len = trimmed.chars().count();
    if len > max {
        return Err(DomainError::FieldTooLong { field, len, max });
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_trimmed() {
        let title = required_text("title", "  Rust 101  ", 20).expect("title should be valid");
        assert_eq!(title, "Rust 101");
    }

    #[test]
    fn blank_text_is_rejected() {
        let err = required_text("title", "   ", 20).expect_err("blank title should be rejected");
        assert_eq!(err, DomainError::EmptyField("title"));
    }

    #[test]
    fn long_text_is_rejected() {
        let err = required_text("title", "a".repeat(21), 20).expect_err("long title");
        assert_eq!(
            err,
            DomainError::FieldTooLong {
                field: "title",
                len: 21,
                max: 20
            }
        );
    }
}
