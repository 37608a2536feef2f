//! Order route handlers.
//!
//! List, detail, the post-checkout confirmation landing page, and customer
//! cancellation. Everything here requires a signed-in customer.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{debug, instrument};

use herbloom_core::{Money, OrderId};

use crate::api::ApiError;
use crate::api::AuthContext;
use crate::api::types::{Order, OrderLine};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAuth, SessionId};
use crate::state::AppState;
use crate::stores::{Flash, FlashStore};

// =============================================================================
// View Types
// =============================================================================

/// One row on the orders list.
pub struct OrderSummaryView {
    pub id: String,
    pub placed: String,
    pub status: String,
    pub status_label: &'static str,
    pub payment_label: &'static str,
    pub item_count: u32,
    pub items_total: String,
}

impl From<&Order> for OrderSummaryView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            placed: order.created_at.format("%B %-d, %Y").to_string(),
            status: order.order_status.to_string(),
            status_label: order.order_status.label(),
            payment_label: order.payment_status.label(),
            item_count: order.products.iter().map(|line| line.quantity).sum(),
            items_total: items_total(order).to_string(),
        }
    }
}

/// A line item on the order detail page.
pub struct OrderLineView {
    pub name: String,
    pub pack_size: String,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
    pub image: Option<String>,
}

impl From<&OrderLine> for OrderLineView {
    fn from(line: &OrderLine) -> Self {
        Self {
            name: line
                .name
                .clone()
                .unwrap_or_else(|| line.product_id.to_string()),
            pack_size: line.variant.pack_size.clone(),
            unit_price: line.variant.price.to_string(),
            quantity: line.quantity,
            line_total: line.line_total().to_string(),
            image: line.variant.images.first().cloned(),
        }
    }
}

/// Shipping details as captured at checkout.
pub struct CustomerView {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: String,
    pub locality: String,
    pub country: String,
}

/// Carrier tracking, shown once the order ships.
pub struct ShipmentView {
    pub awb: Option<String>,
    pub tracking_url: Option<String>,
}

/// Full order detail, shared by the detail and confirmation pages.
pub struct OrderDetailView {
    pub id: String,
    pub placed: String,
    pub status: String,
    pub status_label: &'static str,
    pub cancellable: bool,
    pub payment_label: &'static str,
    pub method_label: Option<&'static str>,
    pub lines: Vec<OrderLineView>,
    pub items_total: String,
    pub customer: CustomerView,
    pub shipment: Option<ShipmentView>,
}

impl From<&Order> for OrderDetailView {
    fn from(order: &Order) -> Self {
        let info = &order.customer_info;
        let locality = [info.city.as_deref(), info.state.as_deref(), info.zip.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            id: order.id.to_string(),
            placed: order.created_at.format("%B %-d, %Y").to_string(),
            status: order.order_status.to_string(),
            status_label: order.order_status.label(),
            cancellable: order.order_status.is_cancellable(),
            payment_label: order.payment_status.label(),
            method_label: order.payment_method.map(|method| method.label()),
            lines: order.products.iter().map(OrderLineView::from).collect(),
            items_total: items_total(order).to_string(),
            customer: CustomerView {
                name: info.name.clone(),
                email: info.email.clone(),
                phone: info.phone.clone(),
                address: info.address.clone(),
                locality,
                country: info.country.clone(),
            },
            shipment: order.shipment_info.as_ref().map(|shipment| ShipmentView {
                awb: shipment.awb.clone(),
                tracking_url: shipment.tracking_url.clone(),
            }),
        }
    }
}

/// Item total at the frozen order prices. The backend's own figure is
/// displayed nowhere.
fn items_total(order: &Order) -> Money {
    order.products.iter().map(OrderLine::line_total).sum()
}

// =============================================================================
// Templates
// =============================================================================

/// Orders list page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub orders: Vec<OrderSummaryView>,
    pub load_failed: bool,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub order: OrderDetailView,
    pub flash: Option<Flash>,
}

/// Post-checkout confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/confirmation.html")]
pub struct OrderConfirmationTemplate {
    pub order: OrderDetailView,
    pub flash: Option<Flash>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the customer's orders, newest first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session_id: SessionId,
    RequireAuth(record): RequireAuth,
) -> Result<Response, AppError> {
    let ctx = AuthContext::new(session_id.value(), Some(record.token));

    let (orders, load_failed) = match state.api().my_orders(&ctx).await {
        Ok(mut orders) => {
            orders.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
            (orders, false)
        }
        Err(ApiError::Unauthorized) => return Err(AppError::Api(ApiError::Unauthorized)),
        Err(e) => {
            tracing::error!("Failed to fetch orders: {e}");
            (Vec::new(), true)
        }
    };

    let page = OrdersIndexTemplate {
        orders: orders.iter().map(OrderSummaryView::from).collect(),
        load_failed,
    };
    Ok(page.into_response())
}

/// Display one order with line items, shipping details, and tracking.
///
/// # Errors
///
/// Returns an error when the order does not exist or belongs to someone
/// else.
#[instrument(skip_all, fields(order_id = %order_id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    session_id: SessionId,
    RequireAuth(record): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Response, AppError> {
    let ctx = AuthContext::new(session_id.value(), Some(record.token));
    let order = state.api().get_order(&ctx, &order_id).await?;
    let flash = FlashStore::new(session).take().await;

    let page = OrderShowTemplate {
        order: OrderDetailView::from(&order),
        flash,
    };
    Ok(page.into_response())
}

/// Post-checkout landing page.
///
/// # Errors
///
/// Returns an error when the order does not exist or belongs to someone
/// else.
#[instrument(skip_all, fields(order_id = %order_id))]
pub async fn confirmation(
    State(state): State<AppState>,
    session: Session,
    session_id: SessionId,
    RequireAuth(record): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Response, AppError> {
    let ctx = AuthContext::new(session_id.value(), Some(record.token));
    let order = state.api().get_order(&ctx, &order_id).await?;
    let flash = FlashStore::new(session).take().await;

    let page = OrderConfirmationTemplate {
        order: OrderDetailView::from(&order),
        flash,
    };
    Ok(page.into_response())
}

/// Cancel an order that has not shipped yet.
///
/// The backend enforces which statuses allow cancellation; either outcome
/// lands back on the detail page as a flash message.
///
/// # Errors
///
/// Returns an error for expired credentials.
#[instrument(skip_all, fields(order_id = %order_id))]
pub async fn cancel(
    State(state): State<AppState>,
    session: Session,
    session_id: SessionId,
    RequireAuth(record): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Response, AppError> {
    let ctx = AuthContext::new(session_id.value(), Some(record.token));
    let flash = FlashStore::new(session);

    match state.api().cancel_order(&ctx, &order_id).await {
        Ok(order) => {
            debug!(status = %order.order_status, "Order cancelled");
            flash
                .push(Flash::success("Your order has been cancelled."))
                .await;
        }
        Err(ApiError::Unauthorized) => return Err(AppError::Api(ApiError::Unauthorized)),
        Err(ApiError::Validation(message)) => {
            flash.push(Flash::error(message)).await;
        }
        Err(e) => {
            tracing::error!("Order cancellation failed: {e}");
            flash
                .push(Flash::error(
                    "We could not cancel this order. Please try again.",
                ))
                .await;
        }
    }

    Ok(Redirect::to(&format!("/orders/{order_id}")).into_response())
}
