//! Herbloom backend REST client implementation.
//!
//! One `reqwest::Client` with a per-request timeout behind a cheaply
//! cloneable handle. Catalog reads are cached with `moka` (5-minute TTL);
//! cart, order, auth, and payment calls always hit the backend.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use herbloom_core::{CartItemId, Money, OrderId, PaymentMethod, ProductId, VariantId};

use crate::api::ApiError;
use crate::api::cache::CacheValue;
use crate::api::types::{
    AuthResponse, Cart, Category, CreateOrderRequest, CustomerInfo, Order, OrderLineInput,
    PaymentOrder, Product, Review, ShippingCost, User, VerifyPaymentRequest, VerifyResult,
};
use crate::config::BackendApiConfig;

/// Per-request identity handed to the client.
///
/// Built fresh for each request from the session: the browser's session
/// identifier plus the bearer token when the customer is signed in. The
/// client never reads or writes ambient auth state.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Durable anonymous session identifier from the `sessionId` cookie.
    pub session_id: String,
    /// Bearer token, present once the customer has signed in.
    pub token: Option<String>,
}

impl AuthContext {
    /// Context for a signed-in customer.
    #[must_use]
    pub fn new(session_id: impl Into<String>, token: Option<String>) -> Self {
        Self {
            session_id: session_id.into(),
            token,
        }
    }

    /// Context for a guest browsing without an account.
    #[must_use]
    pub fn anonymous(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            token: None,
        }
    }
}

/// Uniform response envelope used by every backend endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Herbloom backend API.
///
/// Provides typed access to catalog, cart, order, payment, auth, and review
/// endpoints. Catalog reads are cached for 5 minutes.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Create a new backend API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &BackendApiConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Attach the bearer token when the context holds one.
    fn authed(
        request: reqwest::RequestBuilder,
        ctx: &AuthContext,
    ) -> reqwest::RequestBuilder {
        match &ctx.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and unwrap the `{ "data": ... }` envelope.
    ///
    /// `resource` labels what was being fetched for 404 errors.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting before consuming the body
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(map_error_status(status, &response_text, resource));
        }

        let envelope: Envelope<T> = match serde_json::from_str(&response_text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse backend response"
                );
                return Err(ApiError::Parse(e));
            }
        };

        Ok(envelope.data)
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get the product list, optionally capped by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self, limit: Option<u32>) -> Result<Vec<Product>, ApiError> {
        let cache_key = format!("products:{limit:?}");

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut request = self.inner.client.get(self.url("/products"));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }

        let products: Vec<Product> = self.execute(request, "Products").await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Full-text product search on the backend. Never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url("/products/search"))
            .query(&[("q", query)]);

        self.execute(request, "Products").await
    }

    /// Get a single product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{product_id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let request = self
            .inner
            .client
            .get(self.url(&format!("/products/{product_id}")));

        let product: Product = self.execute(request, "Product").await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<Category>, ApiError> {
        let cache_key = "categories".to_string();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let request = self.inner.client.get(self.url("/categories"));

        let categories: Vec<Category> = self.execute(request, "Categories").await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Get the cart bound to a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx), fields(session_id = %ctx.session_id))]
    pub async fn get_cart(&self, ctx: &AuthContext) -> Result<Cart, ApiError> {
        let request = Self::authed(
            self.inner
                .client
                .get(self.url(&format!("/cart/{}", ctx.session_id))),
            ctx,
        );

        self.execute(request, "Cart").await
    }

    /// Add a variant to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the input is rejected.
    #[instrument(skip(self, ctx), fields(session_id = %ctx.session_id, product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        ctx: &AuthContext,
        product_id: &ProductId,
        variant_id: &VariantId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let body = serde_json::json!({
            "productId": product_id,
            "variantId": variant_id,
            "quantity": quantity,
            "sessionId": ctx.session_id,
        });

        let request = Self::authed(self.inner.client.post(self.url("/cart/add")), ctx).json(&body);

        self.execute(request, "Cart").await
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the input is rejected.
    #[instrument(skip(self, ctx), fields(session_id = %ctx.session_id, item_id = %item_id))]
    pub async fn update_cart_item(
        &self,
        ctx: &AuthContext,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let body = serde_json::json!({
            "itemId": item_id,
            "quantity": quantity,
            "sessionId": ctx.session_id,
        });

        let request =
            Self::authed(self.inner.client.put(self.url("/cart/update")), ctx).json(&body);

        self.execute(request, "Cart").await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx), fields(session_id = %ctx.session_id, item_id = %item_id))]
    pub async fn remove_from_cart(
        &self,
        ctx: &AuthContext,
        item_id: &CartItemId,
    ) -> Result<Cart, ApiError> {
        let body = serde_json::json!({
            "itemId": item_id,
            "sessionId": ctx.session_id,
        });

        let request =
            Self::authed(self.inner.client.post(self.url("/cart/remove")), ctx).json(&body);

        self.execute(request, "Cart").await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx), fields(session_id = %ctx.session_id))]
    pub async fn clear_cart(&self, ctx: &AuthContext) -> Result<Cart, ApiError> {
        let body = serde_json::json!({ "sessionId": ctx.session_id });

        let request =
            Self::authed(self.inner.client.post(self.url("/cart/clear")), ctx).json(&body);

        self.execute(request, "Cart").await
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Create an order from the given lines and shipping details.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the input is rejected.
    #[instrument(skip(self, ctx, products, customer_info), fields(session_id = %ctx.session_id))]
    pub async fn create_order(
        &self,
        ctx: &AuthContext,
        products: Vec<OrderLineInput>,
        customer_info: CustomerInfo,
        payment_method: PaymentMethod,
    ) -> Result<Order, ApiError> {
        let body = CreateOrderRequest {
            products,
            customer_info,
            payment_method,
            session_id: ctx.session_id.clone(),
        };

        let request =
            Self::authed(self.inner.client.post(self.url("/orders/create")), ctx).json(&body);

        self.execute(request, "Order").await
    }

    /// Get the signed-in customer's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx), fields(session_id = %ctx.session_id))]
    pub async fn my_orders(&self, ctx: &AuthContext) -> Result<Vec<Order>, ApiError> {
        let request = Self::authed(
            self.inner
                .client
                .get(self.url("/orders/my-orders"))
                .query(&[("sessionId", ctx.session_id.as_str())]),
            ctx,
        );

        self.execute(request, "Orders").await
    }

    /// Get one order by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the API request fails.
    #[instrument(skip(self, ctx), fields(order_id = %order_id))]
    pub async fn get_order(&self, ctx: &AuthContext, order_id: &OrderId) -> Result<Order, ApiError> {
        let request = Self::authed(
            self.inner
                .client
                .get(self.url(&format!("/orders/{order_id}")))
                .query(&[("sessionId", ctx.session_id.as_str())]),
            ctx,
        );

        self.execute(request, "Order").await
    }

    /// Cancel an order. The backend enforces which statuses allow it.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or cancellation is refused.
    #[instrument(skip(self, ctx), fields(order_id = %order_id))]
    pub async fn cancel_order(
        &self,
        ctx: &AuthContext,
        order_id: &OrderId,
    ) -> Result<Order, ApiError> {
        let body = serde_json::json!({ "sessionId": ctx.session_id });

        let request = Self::authed(
            self.inner
                .client
                .post(self.url(&format!("/orders/{order_id}/cancel"))),
            ctx,
        )
        .json(&body);

        self.execute(request, "Order").await
    }

    // =========================================================================
    // Payment Methods
    // =========================================================================

    /// Create a gateway payment order for an existing order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx), fields(order_id = %order_id))]
    pub async fn create_payment(
        &self,
        ctx: &AuthContext,
        order_id: &OrderId,
    ) -> Result<PaymentOrder, ApiError> {
        let body = serde_json::json!({ "orderId": order_id });

        let request = Self::authed(
            self.inner.client.post(self.url("/payment/create-order")),
            ctx,
        )
        .json(&body);

        self.execute(request, "Payment order").await
    }

    /// Submit the gateway callback for signature verification.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all, fields(session_id = %ctx.session_id))]
    pub async fn verify_payment(
        &self,
        ctx: &AuthContext,
        razorpay_order_id: &str,
        razorpay_payment_id: &str,
        razorpay_signature: &str,
    ) -> Result<VerifyResult, ApiError> {
        let body = VerifyPaymentRequest {
            razorpay_order_id: razorpay_order_id.to_string(),
            razorpay_payment_id: razorpay_payment_id.to_string(),
            razorpay_signature: razorpay_signature.to_string(),
            session_id: ctx.session_id.clone(),
        };

        let request =
            Self::authed(self.inner.client.post(self.url("/payment/verify")), ctx).json(&body);

        self.execute(request, "Payment").await
    }

    /// Get the flat shipping cost applied below the free-shipping threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn shipping_cost(&self) -> Result<Money, ApiError> {
        let request = self.inner.client.get(self.url("/shipping/cost"));

        let payload: ShippingCost = self.execute(request, "Shipping cost").await?;
        Ok(payload.cost)
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        session_id: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "sessionId": session_id,
        });

        let request = self.inner.client.post(self.url("/auth/login")).json(&body);

        self.execute(request, "Account").await
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is rejected or the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        session_id: &str,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let body = serde_json::json!({
            "name": name,
            "email": email,
            "password": password,
            "sessionId": session_id,
        });

        let request = self
            .inner
            .client
            .post(self.url("/auth/register"))
            .json(&body);

        self.execute(request, "Account").await
    }

    /// Get the signed-in customer's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is missing/expired or the request fails.
    #[instrument(skip(self, ctx), fields(session_id = %ctx.session_id))]
    pub async fn profile(&self, ctx: &AuthContext) -> Result<User, ApiError> {
        let request = Self::authed(
            self.inner
                .client
                .get(self.url("/auth/profile"))
                .query(&[("sessionId", ctx.session_id.as_str())]),
            ctx,
        );

        self.execute(request, "Profile").await
    }

    // =========================================================================
    // Contact & Reviews
    // =========================================================================

    /// Forward a contact-form submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the input is rejected.
    #[instrument(skip(self, message), fields(email = %email))]
    pub async fn submit_contact(
        &self,
        name: &str,
        email: &str,
        message: &str,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "name": name,
            "email": email,
            "message": message,
        });

        let request = self.inner.client.post(self.url("/contact")).json(&body);

        let _: serde_json::Value = self.execute(request, "Contact").await?;
        Ok(())
    }

    /// Get reviews for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_reviews(&self, product_id: &ProductId) -> Result<Vec<Review>, ApiError> {
        let cache_key = format!("reviews:{product_id}");

        if let Some(CacheValue::Reviews(reviews)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for reviews");
            return Ok(reviews);
        }

        let request = self
            .inner
            .client
            .get(self.url(&format!("/reviews/{product_id}")));

        let reviews: Vec<Review> = self.execute(request, "Reviews").await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Reviews(reviews.clone()))
            .await;

        Ok(reviews)
    }

    /// Submit a review and invalidate the product's cached reviews.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the input is rejected.
    #[instrument(skip(self, ctx, comment), fields(product_id = %product_id, rating = rating))]
    pub async fn add_review(
        &self,
        ctx: &AuthContext,
        product_id: &ProductId,
        name: &str,
        rating: u8,
        comment: &str,
    ) -> Result<Review, ApiError> {
        let body = serde_json::json!({
            "productId": product_id,
            "name": name,
            "rating": rating,
            "comment": comment,
        });

        let request =
            Self::authed(self.inner.client.post(self.url("/reviews/add")), ctx).json(&body);

        let review: Review = self.execute(request, "Review").await?;

        self.invalidate_reviews(product_id).await;

        Ok(review)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate cached reviews for a product.
    async fn invalidate_reviews(&self, product_id: &ProductId) {
        let cache_key = format!("reviews:{product_id}");
        self.inner.cache.invalidate(&cache_key).await;
    }
}

/// Map a non-success status plus body into the error taxonomy.
fn map_error_status(status: reqwest::StatusCode, body: &str, resource: &str) -> ApiError {
    match status {
        reqwest::StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        reqwest::StatusCode::NOT_FOUND => ApiError::NotFound(resource.to_string()),
        _ => {
            let message = extract_message(body)
                .unwrap_or_else(|| body.chars().take(200).collect::<String>());

            if status.is_client_error() {
                tracing::warn!(status = %status, message = %message, "Backend rejected request");
                ApiError::Validation(message)
            } else {
                tracing::error!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "Backend returned non-success status"
                );
                ApiError::Backend {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}

/// Pull the `message` field out of a backend error body, if it parses.
fn extract_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_map_401_to_unauthorized() {
        let err = map_error_status(reqwest::StatusCode::UNAUTHORIZED, "", "Cart");
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn test_map_404_carries_resource_label() {
        let err = map_error_status(reqwest::StatusCode::NOT_FOUND, "", "Product");
        assert_eq!(err.to_string(), "Product not found");
    }

    #[test]
    fn test_map_400_extracts_json_message() {
        let err = map_error_status(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"message": "quantity must be at least 1"}"#,
            "Cart",
        );
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.to_string(), "quantity must be at least 1");
    }

    #[test]
    fn test_map_500_preserves_status() {
        let err = map_error_status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "backend exploded",
            "Cart",
        );
        match err {
            ApiError::Backend { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "backend exploded");
            }
            other => panic!("expected Backend error, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_message_handles_non_json() {
        assert_eq!(extract_message("<html>nope</html>"), None);
        assert_eq!(
            extract_message(r#"{"message": "bad input"}"#),
            Some("bad input".to_string())
        );
        assert_eq!(extract_message(r#"{"error": "no message key"}"#), None);
    }

    #[test]
    fn test_envelope_unwraps_data() {
        let envelope: Envelope<Vec<u32>> = serde_json::from_str(r#"{"data": [1, 2, 3]}"#).unwrap();
        assert_eq!(envelope.data, vec![1, 2, 3]);
    }
}
