//! Domain types for the Herbloom backend API.
//!
//! Field names mirror the backend's JSON (camelCase, Mongo-style `_id`).
//! Money fields arrive as plain JSON numbers and deserialize through
//! [`Money`]'s float representation.

use chrono::{DateTime, Utc};
use herbloom_core::{
    CartItemId, CategoryId, Email, Money, OrderId, OrderStatus, PaymentMethod, PaymentStatus,
    ProductId, ReviewId, UserId, VariantId,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Catalog Types
// =============================================================================

/// A purchasable configuration of a product (pack size).
///
/// Price and stock are variant-scoped; the product itself carries neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    /// Variant id.
    #[serde(rename = "_id")]
    pub id: VariantId,
    /// Pack size label (e.g., "100g", "250g").
    pub pack_size: String,
    /// Current selling price.
    pub price: Money,
    /// Compare-at price shown struck through, when higher than `price`.
    #[serde(default)]
    pub cutoff_price: Option<Money>,
    /// Units in stock. Zero disables add-to-cart.
    pub stock: u32,
    /// Variant-specific images.
    #[serde(default)]
    pub images: Vec<String>,
}

impl Variant {
    /// Whether the variant can currently be added to a cart.
    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A catalog product with its variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product id.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Product-level images, used when a variant has none.
    #[serde(default)]
    pub base_images: Vec<String>,
    /// Benefit bullet points.
    #[serde(default)]
    pub benefits: Vec<String>,
    /// Conditions the product is traditionally used for.
    #[serde(default)]
    pub cures: Vec<String>,
    /// Usage directions.
    #[serde(default)]
    pub usage: Option<String>,
    /// Ingredient list.
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Owning category id.
    pub category: CategoryId,
    /// Free-form tags, searchable.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Inactive products are hidden from the catalog.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Purchasable variants. The first one is the default selection.
    pub variants: Vec<Variant>,
    /// Creation timestamp, used for "newest" sorting.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// The default variant (first in backend order), if any exist.
    #[must_use]
    pub fn first_variant(&self) -> Option<&Variant> {
        self.variants.first()
    }

    /// Cheapest variant price; zero for a product with no variants.
    #[must_use]
    pub fn min_price(&self) -> Money {
        self.variants
            .iter()
            .map(|v| v.price)
            .min()
            .unwrap_or_default()
    }

    /// Most expensive variant price; zero for a product with no variants.
    #[must_use]
    pub fn max_price(&self) -> Money {
        self.variants
            .iter()
            .map(|v| v.price)
            .max()
            .unwrap_or_default()
    }

    /// First available image: default variant image, then base image.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.first_variant()
            .and_then(|v| v.images.first())
            .or_else(|| self.base_images.first())
            .map(String::as_str)
    }
}

const fn default_true() -> bool {
    true
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Category id.
    #[serde(rename = "_id")]
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// URL-safe slug.
    pub slug: String,
    /// Optional blurb.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A customer review on a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ReviewId,
    pub product_id: ProductId,
    /// Display name of the reviewer.
    pub name: String,
    /// Rating, 1 through 5.
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// The variant snapshot embedded in a cart item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartVariant {
    #[serde(rename = "_id")]
    pub id: VariantId,
    pub pack_size: String,
    /// Effective line price per unit.
    pub price: Money,
    pub stock: u32,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A line in the cart. The backend populates the full product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Cart line id (used for update/remove).
    #[serde(rename = "_id")]
    pub id: CartItemId,
    /// Populated product document.
    #[serde(rename = "productId")]
    pub product: Product,
    /// Selected variant snapshot.
    pub variant: CartVariant,
    pub quantity: u32,
}

impl CartItem {
    /// Line total at the variant's current price.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.variant.price * self.quantity
    }
}

/// A cart as held by the backend, keyed by session or user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Backend-computed total. Displayed nowhere; totals are re-derived
    /// locally from line prices.
    #[serde(default)]
    pub total_amount: Money,
}

impl Cart {
    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Order Types
// =============================================================================

/// The frozen variant snapshot on an order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderVariant {
    pub pack_size: String,
    /// Unit price at order time.
    pub price: Money,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A line item on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(rename = "_id")]
    pub id: String,
    pub product_id: ProductId,
    /// Product name captured at order time.
    #[serde(default)]
    pub name: Option<String>,
    pub variant: OrderVariant,
    pub quantity: u32,
}

impl OrderLine {
    /// Line total at the frozen order price.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.variant.price * self.quantity
    }
}

/// Shipping details collected at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub address: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "India".to_string()
}

/// Carrier tracking details attached once an order ships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentInfo {
    #[serde(default)]
    pub carrier_order_id: Option<String>,
    /// Air waybill number.
    #[serde(default)]
    pub awb: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
}

/// An order as held by the backend. Immutable after creation except for
/// status transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub products: Vec<OrderLine>,
    pub customer_info: CustomerInfo,
    pub total_amount: Money,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    pub order_status: OrderStatus,
    #[serde(default)]
    pub shipment_info: Option<ShipmentInfo>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Auth Types
// =============================================================================

/// A customer account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Successful login or registration response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// =============================================================================
// Payment Types
// =============================================================================

/// A gateway payment order created for online checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentOrder {
    /// Gateway order id, handed to the browser widget.
    pub id: String,
    /// Amount in paise.
    pub amount: i64,
    /// ISO currency code (INR).
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
}

/// Result of backend signature verification.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResult {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payment verification request. The `razorpay_*` field names match what the
/// gateway widget hands back, so they stay snake_case on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

// =============================================================================
// Request Types
// =============================================================================

/// One line of an order draft.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: u32,
    /// Unit price the customer saw; the backend revalidates it.
    pub price: Money,
}

/// Order creation request built from the cart at checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub products: Vec<OrderLineInput>,
    pub customer_info: CustomerInfo,
    pub payment_method: PaymentMethod,
    pub session_id: String,
}

/// Shipping cost payload from `GET /shipping/cost`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingCost {
    pub cost: Money,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    const PRODUCT_JSON: &str = r#"{
        "_id": "665f1a2b3c4d5e6f70818283",
        "name": "Ashwagandha Root Powder",
        "description": "Stone-ground ashwagandha root.",
        "baseImages": ["https://cdn.herbloom.in/ashwagandha.jpg"],
        "benefits": ["Calm", "Sleep support"],
        "cures": ["Restlessness"],
        "usage": "Half a teaspoon with warm milk.",
        "ingredients": ["Withania somnifera"],
        "category": "664a0b1c2d3e4f5061728394",
        "tags": ["ayurveda", "adaptogen"],
        "isActive": true,
        "variants": [
            {
                "_id": "v-100g",
                "packSize": "100g",
                "price": 299,
                "cutoffPrice": 349,
                "stock": 12,
                "images": []
            },
            {
                "_id": "v-250g",
                "packSize": "250g",
                "price": 649.5,
                "cutoffPrice": 749,
                "stock": 0,
                "images": ["https://cdn.herbloom.in/ashwagandha-250.jpg"]
            }
        ],
        "createdAt": "2025-06-01T08:30:00.000Z",
        "updatedAt": "2025-06-10T08:30:00.000Z"
    }"#;

    #[test]
    fn test_product_deserializes_from_backend_shape() {
        let product: Product = serde_json::from_str(PRODUCT_JSON).unwrap();

        assert_eq!(product.id.as_str(), "665f1a2b3c4d5e6f70818283");
        assert_eq!(product.name, "Ashwagandha Root Powder");
        assert_eq!(product.variants.len(), 2);
        assert!(product.is_active);

        let first = product.first_variant().unwrap();
        assert_eq!(first.pack_size, "100g");
        assert_eq!(first.price.amount(), Decimal::from(299));
        assert!(first.is_in_stock());
        assert!(!product.variants[1].is_in_stock());
    }

    #[test]
    fn test_product_price_bounds() {
        let product: Product = serde_json::from_str(PRODUCT_JSON).unwrap();

        assert_eq!(product.min_price().amount(), Decimal::from(299));
        assert_eq!(product.max_price().amount(), Decimal::new(6495, 1));
    }

    #[test]
    fn test_primary_image_prefers_variant_then_base() {
        let mut product: Product = serde_json::from_str(PRODUCT_JSON).unwrap();

        // First variant has no images, so the base image wins
        assert_eq!(
            product.primary_image(),
            Some("https://cdn.herbloom.in/ashwagandha.jpg")
        );

        product.variants[0].images = vec!["https://cdn.herbloom.in/v100.jpg".to_string()];
        assert_eq!(
            product.primary_image(),
            Some("https://cdn.herbloom.in/v100.jpg")
        );
    }

    #[test]
    fn test_cart_item_line_total() {
        let json = format!(
            r#"{{
                "_id": "line-1",
                "productId": {PRODUCT_JSON},
                "variant": {{
                    "_id": "v-100g",
                    "packSize": "100g",
                    "price": 299,
                    "stock": 12,
                    "images": []
                }},
                "quantity": 3
            }}"#
        );
        let item: CartItem = serde_json::from_str(&json).unwrap();

        assert_eq!(item.line_total().amount(), Decimal::from(897));
    }

    #[test]
    fn test_cart_item_count_sums_quantities() {
        let json = format!(
            r#"{{
                "_id": "cart-1",
                "items": [
                    {{
                        "_id": "line-1",
                        "productId": {PRODUCT_JSON},
                        "variant": {{"_id": "v-100g", "packSize": "100g", "price": 299, "stock": 12, "images": []}},
                        "quantity": 2
                    }},
                    {{
                        "_id": "line-2",
                        "productId": {PRODUCT_JSON},
                        "variant": {{"_id": "v-250g", "packSize": "250g", "price": 649.5, "stock": 4, "images": []}},
                        "quantity": 1
                    }}
                ],
                "totalAmount": 1247.5
            }}"#
        );
        let cart: Cart = serde_json::from_str(&json).unwrap();

        assert_eq!(cart.item_count(), 3);
        assert!(!cart.is_empty());
    }

    #[test]
    fn test_order_deserializes_statuses() {
        let json = r#"{
            "_id": "ord-1",
            "products": [
                {
                    "_id": "op-1",
                    "productId": "665f1a2b3c4d5e6f70818283",
                    "name": "Ashwagandha Root Powder",
                    "variant": {"packSize": "100g", "price": 299, "images": []},
                    "quantity": 2
                }
            ],
            "customerInfo": {
                "name": "Asha Nair",
                "phone": "9876543210",
                "address": "12 Lake View Road",
                "city": "Kochi",
                "state": "Kerala",
                "zip": "682001",
                "country": "India"
            },
            "totalAmount": 598,
            "paymentStatus": "paid",
            "paymentMethod": "online",
            "razorpayOrderId": "order_NXhJ2f",
            "razorpayPaymentId": "pay_NXhK9q",
            "orderStatus": "confirmed",
            "shipmentInfo": {"awb": "AWB123", "trackingUrl": "https://track.example/AWB123"},
            "createdAt": "2025-07-01T10:00:00.000Z"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();

        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.order_status, OrderStatus::Confirmed);
        assert_eq!(order.payment_method, Some(PaymentMethod::Online));
        assert_eq!(order.products[0].line_total().amount(), Decimal::from(598));
        assert_eq!(
            order.shipment_info.unwrap().awb.as_deref(),
            Some("AWB123")
        );
    }

    #[test]
    fn test_create_order_request_wire_keys() {
        let request = CreateOrderRequest {
            products: vec![OrderLineInput {
                product_id: ProductId::from("p-1"),
                variant_id: VariantId::from("v-1"),
                quantity: 2,
                price: Money::from_major(299),
            }],
            customer_info: CustomerInfo {
                name: "Asha Nair".to_string(),
                email: None,
                phone: Some("9876543210".to_string()),
                address: "12 Lake View Road".to_string(),
                city: Some("Kochi".to_string()),
                state: Some("Kerala".to_string()),
                zip: Some("682001".to_string()),
                country: "India".to_string(),
            },
            payment_method: PaymentMethod::Cod,
            session_id: "sess-1".to_string(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["products"][0]["productId"], "p-1");
        assert_eq!(value["products"][0]["variantId"], "v-1");
        assert_eq!(value["paymentMethod"], "cod");
        assert_eq!(value["sessionId"], "sess-1");
        assert_eq!(value["customerInfo"]["name"], "Asha Nair");
    }

    #[test]
    fn test_verify_payment_request_wire_keys() {
        let request = VerifyPaymentRequest {
            razorpay_order_id: "order_NXhJ2f".to_string(),
            razorpay_payment_id: "pay_NXhK9q".to_string(),
            razorpay_signature: "sig".to_string(),
            session_id: "sess-1".to_string(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["razorpay_order_id"], "order_NXhJ2f");
        assert_eq!(value["razorpay_payment_id"], "pay_NXhK9q");
        assert_eq!(value["razorpay_signature"], "sig");
        assert_eq!(value["sessionId"], "sess-1");
    }
}
