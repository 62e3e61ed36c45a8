//! Cache types for Storefront API responses.

use crate::shopify::types::{Collection, CollectionSummary, Page, ProductCard, ProductDetail};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<ProductDetail>),
    Products(Page<ProductCard>),
    Collection(Box<Collection>),
    Collections(Page<CollectionSummary>),
}

/// Cache key for a product page.
pub fn product_key(handle: &str) -> String {
    format!("product:{handle}")
}

/// Cache key for a page of products.
pub fn products_key(first: i64, after: Option<&str>) -> String {
    format!("products:{first}:{}", after.unwrap_or(""))
}

/// Cache key for a collection page.
pub fn collection_key(handle: &str, first: i64, after: Option<&str>) -> String {
    format!("collection:{handle}:{first}:{}", after.unwrap_or(""))
}

/// Cache key for a page of collections.
pub fn collections_key(first: i64, after: Option<&str>) -> String {
    format!("collections:{first}:{}", after.unwrap_or(""))
}
