//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Home page
//! GET  /health                   - Liveness probe
//!
//! # Products
//! GET  /products                 - Listing (category filter, search, sort)
//! GET  /products/{id}            - Product detail
//! POST /products/{id}/reviews    - Submit a review (requires auth)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                     - Cart page
//! POST /cart/add                 - Add a variant (triggers cart-updated)
//! POST /cart/update              - Set a line's quantity
//! POST /cart/remove              - Remove a line
//! POST /cart/clear               - Empty the cart
//! GET  /cart/count               - Count badge (fragment)
//! GET  /cart/drawer              - Mini-cart drawer (fragment)
//!
//! # Checkout (requires auth)
//! GET  /checkout                 - Shipping details form
//! POST /checkout                 - Create the order (COD or online)
//! GET  /checkout/payment         - Payment widget page
//! POST /checkout/verify          - Gateway outcome callback (JSON)
//!
//! # Orders (requires auth)
//! GET  /orders                   - Order history
//! GET  /orders/{id}              - Order detail with tracking
//! GET  /orders/confirmation/{id} - Post-checkout confirmation
//! POST /orders/{id}/cancel       - Cancel while pending or processing
//!
//! # Auth
//! GET  /auth/login               - Login page
//! POST /auth/login               - Login action
//! GET  /auth/register            - Register page
//! POST /auth/register            - Register action
//! POST /auth/logout              - Logout action
//!
//! # Account (requires auth)
//! GET  /account                  - Profile overview
//!
//! # Contact
//! GET  /contact                  - Contact form
//! POST /contact                  - Submit the form
//!
//! # Content pages
//! GET  /about                    - About the store
//! GET  /privacy-policy           - Privacy policy
//! GET  /terms-of-service         - Terms of service
//! GET  /shipping-policy          - Shipping policy
//! GET  /refund-policy            - Refund policy
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod home;
pub mod orders;
pub mod pages;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
///
/// Login and registration get the strict limiter to slow down credential
/// stuffing.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the product routes router.
///
/// Listing and detail stay unthrottled; review submission shares the
/// relaxed limiter with the other mutating routes.
pub fn product_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/{id}/reviews", post(products::submit_review))
        .layer(api_rate_limiter());

    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .merge(mutations)
}

/// Create the cart routes router.
///
/// The count and drawer fragments fire on every page view, so only the
/// mutations are rate limited.
pub fn cart_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .layer(api_rate_limiter());

    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/drawer", get(cart::drawer))
        .merge(mutations)
}

/// Create the checkout routes router.
///
/// Order creation and payment verification are the expensive calls; the
/// form and payment pages stay unthrottled.
pub fn checkout_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/", post(checkout::create_order))
        .route("/verify", post(checkout::verify_payment))
        .layer(api_rate_limiter());

    Router::new()
        .route("/", get(checkout::show))
        .route("/payment", get(checkout::payment_page))
        .merge(mutations)
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/{id}/cancel", post(orders::cancel))
        .layer(api_rate_limiter());

    Router::new()
        .route("/", get(orders::index))
        .route("/confirmation/{id}", get(orders::confirmation))
        .route("/{id}", get(orders::show))
        .merge(mutations)
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout routes
        .nest("/checkout", checkout_routes())
        // Order routes
        .nest("/orders", order_routes())
        // Auth routes
        .nest("/auth", auth_routes())
        // Account routes
        .route("/account", get(account::index))
        // Contact routes
        .route("/contact", get(contact::show).post(contact::submit))
        // Markdown content pages
        .merge(pages::router())
}
