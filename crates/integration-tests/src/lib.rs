//! Cross-crate behaviour tests for Herbloom.
//!
//! These tests exercise the storefront library the way its handlers do,
//! without a running backend: session stores run against an in-memory
//! session, catalog browsing runs against fixture products, and money
//! flows run through the same types the pages render.
//!
//! # Test files
//!
//! - `catalog_browsing` - listing filter, sort and pagination
//! - `checkout_totals` - subtotal and shipping math at the boundaries
//! - `session_stores` - auth, cart snapshot, checkout and flash stores
//!
//! Run with `cargo test -p herbloom-integration-tests`.
