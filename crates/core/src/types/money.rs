//! Monetary amounts.

use core::fmt;
use std::ops::{Add, AddAssign, Mul};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// ISO 4217 currency code.
///
/// The storefront currently trades in a single currency, but amounts carry
/// their currency so that templates and the payment gateway never have to
/// guess.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Indian rupee.
    #[default]
    Inr,
}

impl Currency {
    /// Returns the symbol used when rendering amounts.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Inr => "₹",
        }
    }

    /// Returns the ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Inr => "INR",
        }
    }
}

/// A monetary amount with its currency.
///
/// Amounts are stored as [`Decimal`] to avoid floating-point drift when
/// summing line items. Serialized as a plain JSON number because the
/// backend API exchanges prices as numbers.
///
/// ## Examples
///
/// ```
/// use herbloom_core::Money;
/// use rust_decimal::Decimal;
///
/// let price = Money::from_major(299);
/// let total = price * 2;
/// assert_eq!(total.amount(), Decimal::from(598));
/// assert_eq!(total.display(), "₹598.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    #[serde(skip)]
    currency: Currency,
}

impl Money {
    /// Creates an amount from a decimal value.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self {
            amount,
            currency: Currency::Inr,
        }
    }

    /// Creates an amount from whole currency units (rupees).
    #[must_use]
    pub fn from_major(units: i64) -> Self {
        Self::new(Decimal::from(units))
    }

    /// The zero amount.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(Decimal::ZERO)
    }

    /// Returns the raw decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency of this amount.
    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns the amount in minor units (paise), rounded to the nearest
    /// whole unit. The payment gateway expects amounts in paise.
    #[must_use]
    pub fn minor_units(&self) -> i64 {
        (self.amount * Decimal::from(100))
            .round()
            .to_i64()
            .unwrap_or(i64::MAX)
    }

    /// Formats the amount with its currency symbol and two decimal places.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency.symbol(), self.amount)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency.symbol(), self.amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.amount + rhs.amount)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.amount += rhs.amount;
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self::new(self.amount * Decimal::from(rhs))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimal_places() {
        assert_eq!(Money::from_major(598).display(), "₹598.00");
        assert_eq!(Money::new(Decimal::new(495, 1)).display(), "₹49.50");
        assert_eq!(Money::zero().display(), "₹0.00");
    }

    #[test]
    fn test_addition() {
        let a = Money::from_major(300);
        let b = Money::from_major(250);
        assert_eq!((a + b).amount(), Decimal::from(550));
    }

    #[test]
    fn test_line_total() {
        let unit = Money::new(Decimal::new(14950, 2));
        assert_eq!((unit * 3).amount(), Decimal::new(44850, 2));
    }

    #[test]
    fn test_sum_of_empty_iterator_is_zero() {
        let total: Money = std::iter::empty().sum();
        assert!(total.is_zero());
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(Money::from_major(550).minor_units(), 55000);
        assert_eq!(Money::new(Decimal::new(4999, 2)).minor_units(), 4999);
        assert_eq!(Money::zero().minor_units(), 0);
    }

    #[test]
    fn test_serde_as_number() {
        let price = Money::new(Decimal::new(2995, 1));
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "299.5");

        let parsed: Money = serde_json::from_str("550").unwrap();
        assert_eq!(parsed.amount(), Decimal::from(550));
    }

    #[test]
    fn test_ordering() {
        assert!(Money::from_major(500) < Money::from_major(550));
        assert!(Money::from_major(550) > Money::from_major(500));
    }
}
