use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, DomainError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidRating(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.value()
    }
}

/// Average and count of a course's ratings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: u64,
}

impl RatingSummary {
    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let (sum, count) = ratings
            .into_iter()
            .fold((0u64, 0u64), |(sum, count), r| (sum + u64::from(r.value()), count + 1));

        if count == 0 {
            return Self::default();
        }

        // one decimal place is what the catalog shows
        let average = (sum as f64 / count as f64 * 10.0).round() / 10.0;
        Self {
            average: Some(average),
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_rating_is_created() {
        let rating = Rating::new(5).expect("5 should be valid");

        assert_eq!(rating.value(), 5);
    }

    #[test]
    fn invalid_rating_is_rejected() {
        let err = Rating::new(0).expect_err("0 should be rejected");

        assert_eq!(err.to_string(), "invalid rating: 0. rating must be in [1, 5]");
        assert!(Rating::new(6).is_err());
    }

    #[test]
    fn summary_rounds_to_one_decimal() {
        let ratings = [5, 4, 4].map(|v| Rating::new(v).expect("valid rating"));
        let summary = RatingSummary::from_ratings(ratings);

        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, Some(4.3));
    }

    #[test]
    fn empty_summary_has_no_average() {
        let summary = RatingSummary::from_ratings(Vec::new());

        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, None);
    }
}
