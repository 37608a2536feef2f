//! Cache types for backend API responses.

use crate::api::types::{Category, Product, Review};

/// Cached value types. Catalog reads only; cart and order state is never
/// cached.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Categories(Vec<Category>),
    Reviews(Vec<Review>),
}
