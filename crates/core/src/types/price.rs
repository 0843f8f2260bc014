//! Type-safe price representation using decimal arithmetic.
//!
//! All catalog prices are in Peruvian soles. Amounts are kept as
//! [`Decimal`] so that cart totals and the checkout thresholds compare
//! exactly (`199.99` is never rounded up to `200`).

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in soles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero soles.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Currency symbol used when formatting.
    pub const SYMBOL: &'static str = "S/";

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an integer number of céntimos.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        self * quantity
    }

    /// Format for display (e.g., "S/ 55.00").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{} {:.2}", Self::SYMBOL, self.0.round_dp(2))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Price::from_cents(5500).display(), "S/ 55.00");
        assert_eq!(Price::from_cents(19999).to_string(), "S/ 199.99");
    }

    #[test]
    fn test_times_and_sum() {
        let total: Price = [Price::from_cents(5500).times(2), Price::from_cents(4500)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(15500));
    }

    #[test]
    fn test_deserializes_from_number_and_string() {
        let from_number: Price = serde_json::from_str("55.5").unwrap();
        let from_string: Price = serde_json::from_str("\"55.50\"").unwrap();
        assert_eq!(from_number.amount().normalize(), from_string.amount().normalize());
    }
}
