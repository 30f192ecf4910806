use super::DomainError;

/// Amount in the smallest currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(i64);

impl Price {
    /// Upper bound for a single price and for any total built from prices.
    pub const MAX_CENTS: i64 = 100_000_000_000;

    pub fn new(cents: i64) -> Result<Self, DomainError> {
        if cents < 0 {
            return Err(DomainError::NegativePrice(cents));
        }
        if cents > Self::MAX_CENTS {
            return Err(DomainError::PriceTooLarge(cents));
        }
        Ok(Self(cents))
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Price) -> Result<Price, DomainError> {
        self.0
            .checked_add(other.0)
            .filter(|cents| *cents <= Self::MAX_CENTS)
            .map(Price)
            .ok_or(DomainError::TotalTooLarge)
    }

    pub fn total(prices: impl IntoIterator<Item = Price>) -> Result<Price, DomainError> {
        prices
            .into_iter()
            .try_fold(Price::default(), |total, price| total.checked_add(price))
    }
}
