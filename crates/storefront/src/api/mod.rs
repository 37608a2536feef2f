//! Herbloom backend API client.
//!
//! # Architecture
//!
//! - Plain REST over `reqwest` with a uniform `{ "data": ... }` envelope
//! - The backend is the source of truth - no local persistence, direct calls
//! - In-memory caching via `moka` for catalog reads (5 minute TTL)
//! - No automatic retries; callers decide what a failure means
//!
//! # Request contract
//!
//! Authenticated calls carry `Authorization: Bearer <token>`; cart, order,
//! profile, and payment-verification calls additionally carry the browser's
//! session identifier (JSON body on mutations, query string on reads).
//!
//! # Example
//!
//! ```rust,ignore
//! use herbloom_storefront::api::{ApiClient, AuthContext};
//!
//! let client = ApiClient::new(&config.api)?;
//! let ctx = AuthContext::anonymous("8d5a7c2e-...");
//!
//! let products = client.get_products(None).await?;
//! let cart = client.add_to_cart(&ctx, &products[0].id, &products[0].variants[0].id, 1).await?;
//! ```

mod cache;
mod client;
mod error;
pub mod types;

pub use client::{ApiClient, AuthContext};
pub use error::ApiError;
pub use types::*;
