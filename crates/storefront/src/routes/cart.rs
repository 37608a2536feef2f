//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every mutation calls the backend and then re-syncs the session snapshot
//! from server truth, whether the call succeeded or not.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use herbloom_core::{CartItemId, Money, ProductId, VariantId};

use crate::api::ApiError;
use crate::api::AuthContext;
use crate::checkout::{CheckoutTotals, qualifies_for_free_shipping};
use crate::error::AppError;
use crate::filters;
use crate::state::AppState;
use crate::stores::{CartLineSummary, CartSnapshot, CartStore, Flash, FlashStore};

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub item_id: String,
    pub product_id: String,
    pub name: String,
    pub pack_size: String,
    pub price: String,
    pub quantity: u32,
    pub line_total: String,
    pub image: Option<String>,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub free_shipping: bool,
    pub total: String,
}

impl From<&CartLineSummary> for CartLineView {
    fn from(line: &CartLineSummary) -> Self {
        Self {
            item_id: line.item_id.to_string(),
            product_id: line.product_id.to_string(),
            name: line.name.clone(),
            pack_size: line.pack_size.clone(),
            price: line.unit_price.to_string(),
            quantity: line.quantity,
            line_total: line.total().to_string(),
            image: line.image.clone(),
        }
    }
}

/// Derive the displayed cart from the snapshot and a shipping quote.
///
/// The backend's own cart total is displayed nowhere; the totals shown are
/// recomputed here from line prices.
pub(super) fn cart_view(snapshot: &CartSnapshot, shipping_quote: Money) -> CartView {
    let totals = CheckoutTotals::compute(snapshot.subtotal(), shipping_quote);
    CartView {
        lines: snapshot.lines.iter().map(CartLineView::from).collect(),
        count: snapshot.count,
        subtotal: totals.subtotal.to_string(),
        shipping: totals.shipping.to_string(),
        free_shipping: totals.shipping.is_zero() && !snapshot.is_empty(),
        total: totals.total.to_string(),
    }
}

/// Fetch the flat shipping cost, skipping the call entirely when the
/// subtotal already qualifies for free shipping.
pub(super) async fn shipping_quote(state: &AppState, subtotal: Money) -> Money {
    if qualifies_for_free_shipping(subtotal) {
        return Money::zero();
    }
    match state.api().shipping_cost().await {
        Ok(cost) => cost,
        Err(e) => {
            tracing::error!("Failed to fetch shipping cost: {e}");
            Money::zero()
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: Option<u32>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub item_id: CartItemId,
    pub quantity: u32,
}

/// Remove line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub item_id: CartItemId,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub flash: Option<Flash>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Mini-cart drawer fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_drawer.html")]
pub struct CartDrawerTemplate {
    pub lines: Vec<CartLineView>,
    pub count: u32,
    pub subtotal: String,
}

/// Add-to-cart feedback fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/add_feedback.html")]
pub struct AddFeedbackTemplate {
    pub ok: bool,
    pub message: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ctx: AuthContext,
) -> impl IntoResponse {
    let store = CartStore::new(session.clone());
    let snapshot = store.refresh(&state, &ctx).await;
    let quote = shipping_quote(&state, snapshot.subtotal()).await;
    let flash = FlashStore::new(session).take().await;

    CartShowTemplate {
        cart: cart_view(&snapshot, quote),
        flash,
    }
}

/// Add a variant to the cart (HTMX).
///
/// Responds with an inline feedback fragment; the `cart-updated` trigger
/// tells the badge and any open drawer to refetch.
#[instrument(skip(state, session, ctx))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    ctx: AuthContext,
    Form(form): Form<AddForm>,
) -> Response {
    let quantity = form.quantity.unwrap_or(1).max(1);
    let store = CartStore::new(session);

    let result = state
        .api()
        .add_to_cart(&ctx, &form.product_id, &form.variant_id, quantity)
        .await;

    // Re-sync from the backend no matter how the call went
    store.refresh(&state, &ctx).await;

    let feedback = match result {
        Ok(_) => AddFeedbackTemplate {
            ok: true,
            message: "Added to cart".to_string(),
        },
        Err(ApiError::Unauthorized) => {
            return AppError::Api(ApiError::Unauthorized).into_response();
        }
        Err(ApiError::Validation(message)) => AddFeedbackTemplate { ok: false, message },
        Err(e) => {
            tracing::error!("Failed to add to cart: {e}");
            AddFeedbackTemplate {
                ok: false,
                message: "Could not add to cart. Please try again.".to_string(),
            }
        }
    };

    (AppendHeaders([("HX-Trigger", "cart-updated")]), feedback).into_response()
}

/// Set a line's quantity (HTMX).
#[instrument(skip(state, session, ctx))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    ctx: AuthContext,
    Form(form): Form<UpdateForm>,
) -> Response {
    let store = CartStore::new(session);

    // Decrementing below one is a no-op; render the current state without
    // touching the backend cart
    if form.quantity == 0 {
        let snapshot = store.snapshot().await;
        let quote = shipping_quote(&state, snapshot.subtotal()).await;
        return CartItemsTemplate {
            cart: cart_view(&snapshot, quote),
        }
        .into_response();
    }

    let result = state
        .api()
        .update_cart_item(&ctx, &form.item_id, form.quantity)
        .await;

    if let Err(e) = &result {
        if matches!(e, ApiError::Unauthorized) {
            return AppError::Api(ApiError::Unauthorized).into_response();
        }
        tracing::error!("Failed to update cart line: {e}");
    }

    let snapshot = store.refresh(&state, &ctx).await;
    let quote = shipping_quote(&state, snapshot.subtotal()).await;

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: cart_view(&snapshot, quote),
        },
    )
        .into_response()
}

/// Remove a line from the cart (HTMX).
#[instrument(skip(state, session, ctx))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    ctx: AuthContext,
    Form(form): Form<RemoveForm>,
) -> Response {
    let store = CartStore::new(session);

    let result = state.api().remove_from_cart(&ctx, &form.item_id).await;

    if let Err(e) = &result {
        if matches!(e, ApiError::Unauthorized) {
            return AppError::Api(ApiError::Unauthorized).into_response();
        }
        tracing::error!("Failed to remove cart line: {e}");
    }

    let snapshot = store.refresh(&state, &ctx).await;
    let quote = shipping_quote(&state, snapshot.subtotal()).await;

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: cart_view(&snapshot, quote),
        },
    )
        .into_response()
}

/// Empty the cart (HTMX).
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    ctx: AuthContext,
) -> Response {
    let store = CartStore::new(session);

    let result = state.api().clear_cart(&ctx).await;

    if let Err(e) = &result {
        if matches!(e, ApiError::Unauthorized) {
            return AppError::Api(ApiError::Unauthorized).into_response();
        }
        tracing::error!("Failed to clear cart: {e}");
    }

    let snapshot = store.refresh(&state, &ctx).await;
    let quote = shipping_quote(&state, snapshot.subtotal()).await;

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: cart_view(&snapshot, quote),
        },
    )
        .into_response()
}

/// Cart count badge (HTMX).
///
/// Reads the session snapshot only; mutations keep it fresh, so the badge
/// never costs a backend round trip.
#[instrument(skip_all)]
pub async fn count(session: Session) -> impl IntoResponse {
    let snapshot = CartStore::new(session).snapshot().await;
    CartCountTemplate {
        count: snapshot.count,
    }
}

/// Mini-cart drawer (HTMX).
///
/// Snapshot-only, like the badge. Shipping is shown at the cart page and
/// checkout, not in the drawer.
#[instrument(skip_all)]
pub async fn drawer(session: Session) -> impl IntoResponse {
    let snapshot = CartStore::new(session).snapshot().await;
    CartDrawerTemplate {
        lines: snapshot.lines.iter().map(CartLineView::from).collect(),
        count: snapshot.count,
        subtotal: snapshot.subtotal().to_string(),
    }
}
