//! Checkout state machine.
//!
//! At most one checkout is in flight per session. The machine moves strictly
//! forward:
//!
//! ```text
//! CollectingInfo -> OrderCreated -> CodComplete
//!                                -> PaymentPending -> PaymentVerified
//!                                                  -> PaymentFailed
//! ```
//!
//! `PaymentFailed` is terminal. The backend order already exists at that
//! point with its payment still pending, so the customer places a fresh order
//! rather than re-running verification against a rejected payment.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;

use herbloom_core::{OrderId, PaymentMethod};

use crate::api::types::PaymentOrder;
use crate::stores::keys;

/// Violations of the checkout flow.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// Checkout requires at least one cart line.
    #[error("Your cart is empty")]
    EmptyCart,

    /// A required shipping form field was blank.
    #[error("Please provide your {0}")]
    MissingField(&'static str),

    /// The requested step does not follow from the current state.
    #[error("Checkout cannot {action} from the {stage} step")]
    InvalidTransition {
        stage: &'static str,
        action: &'static str,
    },
}

/// Where a session's checkout currently stands.
///
/// Transitions consume the current state and return the next one, so a state
/// read from the session must be moved through a transition before it can be
/// persisted again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckoutState {
    /// Shipping form shown, nothing submitted yet.
    CollectingInfo,
    /// Backend order exists; the payment fork has not been taken.
    OrderCreated {
        order_id: OrderId,
        payment_method: PaymentMethod,
    },
    /// Cash on delivery order placed. Terminal.
    CodComplete { order_id: OrderId },
    /// Gateway order opened, waiting on the browser widget.
    PaymentPending {
        order_id: OrderId,
        payment_order_id: String,
        amount_paise: i64,
        currency: String,
    },
    /// Backend verified the payment signature. Terminal.
    PaymentVerified { order_id: OrderId },
    /// Verification rejected, or the widget was dismissed. Terminal.
    PaymentFailed { order_id: OrderId },
}

impl Default for CheckoutState {
    fn default() -> Self {
        Self::CollectingInfo
    }
}

impl CheckoutState {
    /// Step label used in transition error messages.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::CollectingInfo => "collecting info",
            Self::OrderCreated { .. } => "order created",
            Self::CodComplete { .. } => "order placed",
            Self::PaymentPending { .. } => "payment pending",
            Self::PaymentVerified { .. } => "payment verified",
            Self::PaymentFailed { .. } => "payment failed",
        }
    }

    /// The backend order this checkout produced, if one exists yet.
    #[must_use]
    pub const fn order_id(&self) -> Option<&OrderId> {
        match self {
            Self::CollectingInfo => None,
            Self::OrderCreated { order_id, .. }
            | Self::CodComplete { order_id }
            | Self::PaymentPending { order_id, .. }
            | Self::PaymentVerified { order_id }
            | Self::PaymentFailed { order_id } => Some(order_id),
        }
    }

    const fn invalid(&self, action: &'static str) -> CheckoutError {
        CheckoutError::InvalidTransition {
            stage: self.stage(),
            action,
        }
    }

    /// Record the backend order created from the shipping form.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] unless the checkout is
    /// still collecting info.
    pub fn order_created(
        self,
        order_id: OrderId,
        payment_method: PaymentMethod,
    ) -> Result<Self, CheckoutError> {
        match self {
            Self::CollectingInfo => Ok(Self::OrderCreated {
                order_id,
                payment_method,
            }),
            other => Err(other.invalid("create an order")),
        }
    }

    /// Close out a cash-on-delivery order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] unless an order was just
    /// created with cash on delivery selected.
    pub fn cod_complete(self) -> Result<Self, CheckoutError> {
        match self {
            Self::OrderCreated {
                order_id,
                payment_method: PaymentMethod::Cod,
            } => Ok(Self::CodComplete { order_id }),
            other => Err(other.invalid("complete as cash on delivery")),
        }
    }

    /// Attach the gateway order an online payment will run against.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] unless an order was just
    /// created with online payment selected.
    pub fn payment_pending(self, payment: &PaymentOrder) -> Result<Self, CheckoutError> {
        match self {
            Self::OrderCreated {
                order_id,
                payment_method: PaymentMethod::Online,
            } => Ok(Self::PaymentPending {
                order_id,
                payment_order_id: payment.id.clone(),
                amount_paise: payment.amount,
                currency: payment.currency.clone(),
            }),
            other => Err(other.invalid("open a payment")),
        }
    }

    /// Record a verified payment.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] unless a payment is
    /// pending.
    pub fn payment_verified(self) -> Result<Self, CheckoutError> {
        match self {
            Self::PaymentPending { order_id, .. } => Ok(Self::PaymentVerified { order_id }),
            other => Err(other.invalid("confirm payment")),
        }
    }

    /// Record a rejected or abandoned payment.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] unless a payment is
    /// pending.
    pub fn payment_failed(self) -> Result<Self, CheckoutError> {
        match self {
            Self::PaymentPending { order_id, .. } => Ok(Self::PaymentFailed { order_id }),
            other => Err(other.invalid("record a failed payment")),
        }
    }
}

/// What the browser payment widget reported back.
///
/// The payment page script posts this as JSON. A completed payment carries
/// the gateway's three verification fields; everything else (closed widget,
/// script error) collapses to `Dismissed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Completed {
        razorpay_order_id: String,
        razorpay_payment_id: String,
        razorpay_signature: String,
    },
    Dismissed,
}

/// Typed access to the session's in-flight checkout.
#[derive(Debug, Clone)]
pub struct CheckoutStore {
    session: Session,
}

impl CheckoutStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Current state, defaulting to `CollectingInfo`.
    pub async fn state(&self) -> CheckoutState {
        self.session
            .get(keys::CHECKOUT)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Start over, discarding any in-flight checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn begin(&self) -> Result<CheckoutState, tower_sessions::session::Error> {
        let state = CheckoutState::CollectingInfo;
        self.set(&state).await?;
        Ok(state)
    }

    /// Persist a state reached through a transition.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn set(&self, state: &CheckoutState) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(keys::CHECKOUT, state).await
    }

    /// Drop the checkout record (after confirmation or on logout).
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn clear(&self) -> Result<(), tower_sessions::session::Error> {
        self.session.remove::<CheckoutState>(keys::CHECKOUT).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gateway_order() -> PaymentOrder {
        PaymentOrder {
            id: "order_NXhTzK4m".to_string(),
            amount: 55_000,
            currency: "INR".to_string(),
            receipt: None,
        }
    }

    #[test]
    fn test_cod_path() {
        let state = CheckoutState::CollectingInfo
            .order_created(OrderId::from("o-1"), PaymentMethod::Cod)
            .unwrap()
            .cod_complete()
            .unwrap();

        assert_eq!(
            state,
            CheckoutState::CodComplete {
                order_id: OrderId::from("o-1"),
            }
        );
        assert_eq!(state.order_id(), Some(&OrderId::from("o-1")));
    }

    #[test]
    fn test_online_path_verified() {
        let pending = CheckoutState::CollectingInfo
            .order_created(OrderId::from("o-2"), PaymentMethod::Online)
            .unwrap()
            .payment_pending(&gateway_order())
            .unwrap();

        assert_eq!(
            pending,
            CheckoutState::PaymentPending {
                order_id: OrderId::from("o-2"),
                payment_order_id: "order_NXhTzK4m".to_string(),
                amount_paise: 55_000,
                currency: "INR".to_string(),
            }
        );

        let verified = pending.payment_verified().unwrap();
        assert_eq!(verified.stage(), "payment verified");
    }

    #[test]
    fn test_failed_payment_is_terminal() {
        let failed = CheckoutState::CollectingInfo
            .order_created(OrderId::from("o-3"), PaymentMethod::Online)
            .unwrap()
            .payment_pending(&gateway_order())
            .unwrap()
            .payment_failed()
            .unwrap();

        assert!(matches!(
            failed.clone().payment_verified(),
            Err(CheckoutError::InvalidTransition { .. })
        ));
        assert!(matches!(
            failed.payment_failed(),
            Err(CheckoutError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_payment_fork_respects_method() {
        let cod = CheckoutState::CollectingInfo
            .order_created(OrderId::from("o-4"), PaymentMethod::Cod)
            .unwrap();
        assert!(cod.payment_pending(&gateway_order()).is_err());

        let online = CheckoutState::CollectingInfo
            .order_created(OrderId::from("o-5"), PaymentMethod::Online)
            .unwrap();
        assert!(online.cod_complete().is_err());
    }

    #[test]
    fn test_order_created_only_while_collecting_info() {
        let created = CheckoutState::CollectingInfo
            .order_created(OrderId::from("o-6"), PaymentMethod::Cod)
            .unwrap();

        let err = created
            .order_created(OrderId::from("o-7"), PaymentMethod::Cod)
            .unwrap_err();
        assert_eq!(
            err,
            CheckoutError::InvalidTransition {
                stage: "order created",
                action: "create an order",
            }
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = CheckoutState::CollectingInfo.payment_verified().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Checkout cannot confirm payment from the collecting info step"
        );
    }

    #[test]
    fn test_outcome_parses_widget_payload() {
        let json = r#"{
            "outcome": "completed",
            "razorpay_order_id": "order_N1",
            "razorpay_payment_id": "pay_N2",
            "razorpay_signature": "c0ffee"
        }"#;
        let outcome: PaymentOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(
            outcome,
            PaymentOutcome::Completed {
                razorpay_order_id: "order_N1".to_string(),
                razorpay_payment_id: "pay_N2".to_string(),
                razorpay_signature: "c0ffee".to_string(),
            }
        );

        let dismissed: PaymentOutcome = serde_json::from_str(r#"{"outcome":"dismissed"}"#).unwrap();
        assert_eq!(dismissed, PaymentOutcome::Dismissed);
    }

    #[test]
    fn test_no_order_while_collecting_info() {
        assert_eq!(CheckoutState::CollectingInfo.order_id(), None);
        assert_eq!(CheckoutState::default(), CheckoutState::CollectingInfo);
    }
}
