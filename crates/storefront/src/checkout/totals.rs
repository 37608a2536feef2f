//! Order totals.
//!
//! The subtotal is the sum of cart line totals at snapshot prices. Shipping
//! is free strictly above the threshold; below it the backend quote applies,
//! and callers only fetch the quote when it actually applies.

use rust_decimal::Decimal;

use herbloom_core::Money;

/// Subtotals strictly above this many rupees ship free.
pub const FREE_SHIPPING_THRESHOLD: i64 = 500;

/// Whether an order subtotal qualifies for free shipping.
///
/// The bound is strict: a 500 rupee subtotal still pays shipping.
#[must_use]
pub fn qualifies_for_free_shipping(subtotal: Money) -> bool {
    subtotal.amount() > Decimal::from(FREE_SHIPPING_THRESHOLD)
}

/// The three numbers the cart and checkout pages render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutTotals {
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
}

impl CheckoutTotals {
    /// Compute totals from a subtotal and the backend shipping quote.
    ///
    /// The quote is ignored when the subtotal qualifies for free shipping;
    /// callers skip fetching it in that case and pass zero.
    #[must_use]
    pub fn compute(subtotal: Money, shipping_quote: Money) -> Self {
        let shipping = if qualifies_for_free_shipping(subtotal) {
            Money::zero()
        } else {
            shipping_quote
        };
        Self {
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_shipping_above_threshold() {
        // Two items at 300 and 250 rupees clear the threshold together
        let subtotal = Money::from_major(300) + Money::from_major(250);
        let totals = CheckoutTotals::compute(subtotal, Money::from_major(50));

        assert!(totals.shipping.is_zero());
        assert_eq!(totals.total.amount(), Decimal::from(550));
    }

    #[test]
    fn test_shipping_charged_at_threshold() {
        let totals = CheckoutTotals::compute(Money::from_major(500), Money::from_major(50));

        assert_eq!(totals.shipping.amount(), Decimal::from(50));
        assert_eq!(totals.total.amount(), Decimal::from(550));
    }

    #[test]
    fn test_qualifies_strictly_above() {
        assert!(!qualifies_for_free_shipping(Money::from_major(500)));
        assert!(qualifies_for_free_shipping(Money::new(Decimal::new(50_001, 2))));
    }

    #[test]
    fn test_total_includes_quoted_shipping() {
        let totals = CheckoutTotals::compute(
            Money::new(Decimal::new(37_450, 2)),
            Money::from_major(40),
        );
        assert_eq!(totals.total.amount(), Decimal::new(41_450, 2));
    }
}
