//! Checkout flow: state machine, totals, and the payment outcome contract.
//!
//! A checkout is a short-lived, strictly forward state machine persisted in
//! the session. The backend owns orders and payment verification; this module
//! only tracks which step the browser is on and which backend order the steps
//! refer to.

mod flow;
mod totals;

pub use flow::{CheckoutError, CheckoutState, CheckoutStore, PaymentOutcome};
pub use totals::{CheckoutTotals, FREE_SHIPPING_THRESHOLD, qualifies_for_free_shipping};
