//! Checkout route handlers.
//!
//! Drives the session checkout through its states: the shipping form
//! collects customer info, order creation forks on payment method, and the
//! gateway outcome lands on `/checkout/verify` as typed JSON.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{debug, instrument};

use herbloom_core::{Money, PaymentMethod};

use crate::api::ApiError;
use crate::api::AuthContext;
use crate::api::types::{CustomerInfo, OrderLineInput, User};
use crate::checkout::{CheckoutError, CheckoutState, CheckoutStore, PaymentOutcome};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth, SessionId};
use crate::state::AppState;
use crate::stores::{CartSnapshot, CartStore, Flash, FlashStore};

use super::cart::{CartView, cart_view, shipping_quote};

// =============================================================================
// Form and View Types
// =============================================================================

/// Shipping details form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub payment_method: PaymentMethod,
}

/// Form values echoed back into the template, so a validation error does
/// not wipe what the customer typed.
#[derive(Clone, Default)]
pub struct CheckoutFormView {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl CheckoutFormView {
    /// First render: prefill from the signed-in customer's profile.
    fn prefill(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.to_string(),
            phone: user.phone.clone().unwrap_or_default(),
            ..Self::default()
        }
    }
}

impl From<&CheckoutForm> for CheckoutFormView {
    fn from(form: &CheckoutForm) -> Self {
        Self {
            name: form.name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            address: form.address.clone(),
            city: form.city.clone(),
            state: form.state.clone(),
            zip: form.zip.clone(),
        }
    }
}

/// Response to the payment page script after `/checkout/verify`.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub redirect: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout form page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub cart: CartView,
    pub form: CheckoutFormView,
    pub error: Option<String>,
    pub flash: Option<Flash>,
}

/// Payment widget page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub nonce: String,
    pub key_id: String,
    pub order_id: String,
    pub payment_order_id: String,
    pub amount_paise: i64,
    pub amount_display: String,
    pub currency: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

// =============================================================================
// Validation
// =============================================================================

/// Trimmed, non-empty form value.
fn required(value: &str, field: &'static str) -> Result<String, CheckoutError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CheckoutError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Validate the form into the shipping details the backend expects.
///
/// The email falls back to the account email when left blank.
fn customer_info(form: &CheckoutForm, user: &User) -> Result<CustomerInfo, CheckoutError> {
    let email = match form.email.trim() {
        "" => user.email.to_string(),
        other => other.to_string(),
    };

    Ok(CustomerInfo {
        name: required(&form.name, "name")?,
        email: Some(email),
        phone: Some(required(&form.phone, "phone number")?),
        address: required(&form.address, "address")?,
        city: Some(required(&form.city, "city")?),
        state: Some(required(&form.state, "state")?),
        zip: Some(required(&form.zip, "postal code")?),
        country: "India".to_string(),
    })
}

/// Render the checkout page for the given snapshot and form values.
async fn checkout_page(
    state: &AppState,
    snapshot: &CartSnapshot,
    form: CheckoutFormView,
    error: Option<String>,
    flash: Option<Flash>,
) -> CheckoutTemplate {
    let quote = shipping_quote(state, snapshot.subtotal()).await;
    CheckoutTemplate {
        cart: cart_view(snapshot, quote),
        form,
        error,
        flash,
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the shipping details form.
///
/// Starts the checkout over: any in-flight state from an abandoned attempt
/// is discarded. An empty cart bounces back to the cart page.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    session_id: SessionId,
    RequireAuth(record): RequireAuth,
) -> Result<Response, AppError> {
    let ctx = AuthContext::new(session_id.value(), Some(record.token.clone()));
    let cart = CartStore::new(session.clone());
    let checkout = CheckoutStore::new(session.clone());
    let flash_store = FlashStore::new(session);

    let snapshot = cart.refresh(&state, &ctx).await;
    if snapshot.is_empty() {
        flash_store
            .push(Flash::info(CheckoutError::EmptyCart.to_string()))
            .await;
        return Ok(Redirect::to("/cart").into_response());
    }

    checkout.begin().await?;
    let flash = flash_store.take().await;

    let page = checkout_page(
        &state,
        &snapshot,
        CheckoutFormView::prefill(&record.user),
        None,
        flash,
    )
    .await;
    Ok(page.into_response())
}

/// Create the order from the current cart and the submitted shipping form.
///
/// Cash on delivery completes immediately; online payment opens a gateway
/// order and moves on to the payment page. Validation and backend errors
/// re-render the form with a banner.
///
/// # Errors
///
/// Returns an error for expired credentials or an out-of-order transition
/// (double submit).
#[instrument(skip_all, fields(payment_method = %form.payment_method))]
pub async fn create_order(
    State(state): State<AppState>,
    session: Session,
    session_id: SessionId,
    RequireAuth(record): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    let ctx = AuthContext::new(session_id.value(), Some(record.token.clone()));
    let cart = CartStore::new(session.clone());
    let checkout = CheckoutStore::new(session.clone());
    let flash = FlashStore::new(session);

    let snapshot = cart.refresh(&state, &ctx).await;
    if snapshot.is_empty() {
        flash
            .push(Flash::info(CheckoutError::EmptyCart.to_string()))
            .await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let info = match customer_info(&form, &record.user) {
        Ok(info) => info,
        Err(e) => {
            let page = checkout_page(
                &state,
                &snapshot,
                CheckoutFormView::from(&form),
                Some(e.to_string()),
                None,
            )
            .await;
            return Ok(page.into_response());
        }
    };

    let lines: Vec<OrderLineInput> = snapshot
        .lines
        .iter()
        .map(|line| OrderLineInput {
            product_id: line.product_id.clone(),
            variant_id: line.variant_id.clone(),
            quantity: line.quantity,
            price: line.unit_price,
        })
        .collect();

    let order = match state
        .api()
        .create_order(&ctx, lines, info, form.payment_method)
        .await
    {
        Ok(order) => order,
        Err(ApiError::Unauthorized) => return Err(AppError::Api(ApiError::Unauthorized)),
        Err(ApiError::Validation(message)) => {
            let page = checkout_page(
                &state,
                &snapshot,
                CheckoutFormView::from(&form),
                Some(message),
                None,
            )
            .await;
            return Ok(page.into_response());
        }
        Err(e) => {
            tracing::error!("Order creation failed: {e}");
            let page = checkout_page(
                &state,
                &snapshot,
                CheckoutFormView::from(&form),
                Some("We could not place your order. Please try again.".to_string()),
                None,
            )
            .await;
            return Ok(page.into_response());
        }
    };

    let created = checkout
        .state()
        .await
        .order_created(order.id.clone(), form.payment_method)?;

    // The backend empties its cart when an order lands; pick that up now
    cart.refresh(&state, &ctx).await;

    match form.payment_method {
        PaymentMethod::Cod => {
            let complete = created.cod_complete()?;
            debug!(stage = complete.stage(), "Checkout complete");
            checkout.clear().await?;
            Ok(Redirect::to(&format!("/orders/confirmation/{}", order.id)).into_response())
        }
        PaymentMethod::Online => match state.api().create_payment(&ctx, &order.id).await {
            Ok(payment) => {
                let pending = created.payment_pending(&payment)?;
                checkout.set(&pending).await?;
                Ok(Redirect::to("/checkout/payment").into_response())
            }
            Err(e) => {
                tracing::error!("Failed to open gateway payment: {e}");
                checkout.clear().await?;
                flash
                    .push(Flash::error(
                        "Your order was placed but the payment could not be started. \
                         It is waiting for payment.",
                    ))
                    .await;
                Ok(Redirect::to(&format!("/orders/{}", order.id)).into_response())
            }
        },
    }
}

/// Display the payment widget page for the pending gateway order.
///
/// Without a pending payment there is nothing to pay; the customer is sent
/// back to the start of checkout.
pub async fn payment_page(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(record): RequireAuth,
    CspNonce(nonce): CspNonce,
) -> Response {
    let checkout = CheckoutStore::new(session);

    let CheckoutState::PaymentPending {
        order_id,
        payment_order_id,
        amount_paise,
        currency,
    } = checkout.state().await
    else {
        return Redirect::to("/checkout").into_response();
    };

    PaymentTemplate {
        nonce,
        key_id: state.config().razorpay_key_id.clone(),
        order_id: order_id.to_string(),
        payment_order_id,
        amount_paise,
        amount_display: Money::new(Decimal::new(amount_paise, 2)).to_string(),
        currency,
        customer_name: record.user.name,
        customer_email: record.user.email.to_string(),
        customer_phone: record.user.phone.unwrap_or_default(),
    }
    .into_response()
}

/// Receive the typed gateway outcome from the payment page script.
///
/// A completed payment goes to the backend for signature verification;
/// failure there is terminal for this checkout (the order stays in its
/// unresolved payment state, nothing is retried). A dismissed widget
/// leaves the payment pending.
///
/// # Errors
///
/// Returns an error when no payment is pending in this session or the
/// backend rejects the credentials.
#[instrument(skip_all)]
pub async fn verify_payment(
    State(state): State<AppState>,
    session: Session,
    session_id: SessionId,
    RequireAuth(record): RequireAuth,
    Json(outcome): Json<PaymentOutcome>,
) -> Result<Json<VerifyResponse>, AppError> {
    let ctx = AuthContext::new(session_id.value(), Some(record.token));
    let checkout = CheckoutStore::new(session.clone());
    let flash = FlashStore::new(session);

    let pending = checkout.state().await;
    let Some(order_id) = pending.order_id().cloned() else {
        return Err(AppError::Checkout(CheckoutError::InvalidTransition {
            stage: pending.stage(),
            action: "verify a payment",
        }));
    };

    match outcome {
        PaymentOutcome::Completed {
            razorpay_order_id,
            razorpay_payment_id,
            razorpay_signature,
        } => {
            let result = state
                .api()
                .verify_payment(
                    &ctx,
                    &razorpay_order_id,
                    &razorpay_payment_id,
                    &razorpay_signature,
                )
                .await;

            match result {
                Ok(verdict) if verdict.success => {
                    let verified = pending.payment_verified()?;
                    debug!(stage = verified.stage(), "Payment verified");
                    checkout.clear().await?;
                    flash.push(Flash::success("Payment received.")).await;
                    Ok(Json(VerifyResponse {
                        redirect: format!("/orders/confirmation/{order_id}"),
                    }))
                }
                Ok(verdict) => {
                    let failed = pending.payment_failed()?;
                    checkout.set(&failed).await?;
                    let message = verdict
                        .message
                        .unwrap_or_else(|| "Payment verification failed.".to_string());
                    flash.push(Flash::error(message)).await;
                    Ok(Json(VerifyResponse {
                        redirect: format!("/orders/{order_id}"),
                    }))
                }
                Err(ApiError::Unauthorized) => Err(AppError::Api(ApiError::Unauthorized)),
                Err(e) => {
                    tracing::error!("Payment verification call failed: {e}");
                    let failed = pending.payment_failed()?;
                    checkout.set(&failed).await?;
                    flash
                        .push(Flash::error(
                            "We could not verify your payment. Our team will review the order.",
                        ))
                        .await;
                    Ok(Json(VerifyResponse {
                        redirect: format!("/orders/{order_id}"),
                    }))
                }
            }
        }
        PaymentOutcome::Dismissed => {
            flash
                .push(Flash::info(
                    "Payment was not completed. Your order is waiting for payment.",
                ))
                .await;
            Ok(Json(VerifyResponse {
                redirect: format!("/orders/{order_id}"),
            }))
        }
    }
}
