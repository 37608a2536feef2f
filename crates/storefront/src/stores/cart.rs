//! Cart snapshot store with sequence-guarded commits.
//!
//! The snapshot mirrors the backend cart for fast badge/drawer rendering.
//! Every refresh takes a ticket from a process-wide counter before fetching;
//! a snapshot only commits if its ticket is newer than the committed one, so
//! two overlapping refreshes cannot land out of order.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::debug;

use herbloom_core::{CartItemId, Money, ProductId, VariantId};

use crate::api::AuthContext;
use crate::api::types::Cart;
use crate::state::AppState;
use crate::stores::keys;

/// One cart line reduced to what the badge and drawer render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineSummary {
    pub item_id: CartItemId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub name: String,
    pub pack_size: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub image: Option<String>,
}

impl CartLineSummary {
    /// Line total at the snapshot's unit price.
    #[must_use]
    pub fn total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// The session's view of the backend cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Refresh ticket this snapshot was taken under.
    pub seq: u64,
    /// Total units across all lines.
    pub count: u32,
    pub lines: Vec<CartLineSummary>,
}

impl CartSnapshot {
    /// An empty snapshot under the given ticket.
    #[must_use]
    pub const fn empty(seq: u64) -> Self {
        Self {
            seq,
            count: 0,
            lines: Vec::new(),
        }
    }

    /// Reduce a backend cart to its snapshot form.
    #[must_use]
    pub fn from_cart(cart: &Cart, seq: u64) -> Self {
        let lines = cart
            .items
            .iter()
            .map(|item| CartLineSummary {
                item_id: item.id.clone(),
                product_id: item.product.id.clone(),
                variant_id: item.variant.id.clone(),
                name: item.product.name.clone(),
                pack_size: item.variant.pack_size.clone(),
                unit_price: item.variant.price,
                quantity: item.quantity,
                image: item
                    .variant
                    .images
                    .first()
                    .or_else(|| item.product.base_images.first())
                    .cloned(),
            })
            .collect();

        Self {
            seq,
            count: cart.item_count(),
            lines,
        }
    }

    /// Sum of line totals at snapshot prices.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLineSummary::total).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Whether a refresh carrying ticket `incoming` may replace the committed
/// ticket `current`. Equal tickets do not re-commit.
#[must_use]
pub const fn accepts(current: u64, incoming: u64) -> bool {
    incoming > current
}

/// Typed access to the session's cart snapshot.
#[derive(Debug, Clone)]
pub struct CartStore {
    session: Session,
}

impl CartStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// The committed snapshot, or an empty default when none exists.
    pub async fn snapshot(&self) -> CartSnapshot {
        self.session
            .get(keys::CART)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Commit a snapshot if it is newer than the committed one.
    ///
    /// Returns whether the snapshot landed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn commit(
        &self,
        snapshot: &CartSnapshot,
    ) -> Result<bool, tower_sessions::session::Error> {
        let current = self.snapshot().await;
        if !accepts(current.seq, snapshot.seq) {
            return Ok(false);
        }
        self.session.insert(keys::CART, snapshot).await?;
        Ok(true)
    }

    /// Fetch the cart from the backend and commit it under a fresh ticket.
    ///
    /// This is the one invalidate-and-reload operation: mutations call it in
    /// both the success and failure arm so the snapshot never drifts from
    /// server truth. A failed fetch commits as empty (the view renders an
    /// empty cart rather than stale lines). Returns the snapshot that is
    /// committed after this call, which may be a newer one than ours if a
    /// concurrent refresh won.
    pub async fn refresh(&self, state: &AppState, ctx: &AuthContext) -> CartSnapshot {
        let ticket = state.next_cart_ticket();

        let snapshot = match state.api().get_cart(ctx).await {
            Ok(cart) => CartSnapshot::from_cart(&cart, ticket),
            Err(e) => {
                tracing::error!(error = %e, "Cart refresh failed, committing empty snapshot");
                CartSnapshot::empty(ticket)
            }
        };

        match self.commit(&snapshot).await {
            Ok(true) => snapshot,
            Ok(false) => {
                debug!(seq = snapshot.seq, "Discarded stale cart refresh");
                self.snapshot().await
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to persist cart snapshot");
                snapshot
            }
        }
    }

    /// Drop the snapshot entirely (logout).
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn clear(&self) -> Result<(), tower_sessions::session::Error> {
        self.session.remove::<CartSnapshot>(keys::CART).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line(price: i64, quantity: u32) -> CartLineSummary {
        CartLineSummary {
            item_id: CartItemId::from("line"),
            product_id: ProductId::from("product"),
            variant_id: VariantId::from("variant"),
            name: "Ashwagandha Root Powder".to_string(),
            pack_size: "100g".to_string(),
            unit_price: Money::from_major(price),
            quantity,
            image: None,
        }
    }

    #[test]
    fn test_accepts_newer_only() {
        assert!(accepts(0, 1));
        assert!(accepts(5, 9));
        assert!(!accepts(3, 3));
        assert!(!accepts(4, 2));
    }

    #[test]
    fn test_subtotal_sums_line_totals() {
        let snapshot = CartSnapshot {
            seq: 1,
            count: 3,
            lines: vec![line(300, 1), line(125, 2)],
        };
        assert_eq!(snapshot.subtotal().amount(), Decimal::from(550));
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = CartSnapshot::empty(7);
        assert_eq!(snapshot.seq, 7);
        assert_eq!(snapshot.count, 0);
        assert!(snapshot.is_empty());
        assert!(snapshot.subtotal().is_zero());
    }

    #[test]
    fn test_from_cart_reduces_lines() {
        let json = r#"{
            "_id": "cart-1",
            "items": [
                {
                    "_id": "line-1",
                    "productId": {
                        "_id": "p-1",
                        "name": "Triphala Churna",
                        "baseImages": ["https://cdn.herbloom.in/triphala.jpg"],
                        "category": "c-1",
                        "variants": [],
                        "createdAt": "2025-05-01T00:00:00Z"
                    },
                    "variant": {
                        "_id": "v-1",
                        "packSize": "250g",
                        "price": 249,
                        "stock": 8,
                        "images": []
                    },
                    "quantity": 2
                }
            ],
            "totalAmount": 498
        }"#;
        let cart: Cart = serde_json::from_str(json).unwrap();

        let snapshot = CartSnapshot::from_cart(&cart, 4);
        assert_eq!(snapshot.seq, 4);
        assert_eq!(snapshot.count, 2);
        assert_eq!(snapshot.lines.len(), 1);

        let line = &snapshot.lines[0];
        assert_eq!(line.name, "Triphala Churna");
        assert_eq!(line.variant_id.as_str(), "v-1");
        assert_eq!(line.pack_size, "250g");
        assert_eq!(line.total().amount(), Decimal::from(498));
        // Variant has no image, so the product base image is used
        assert_eq!(
            line.image.as_deref(),
            Some("https://cdn.herbloom.in/triphala.jpg")
        );
    }
}
