//! Type conversion functions for Shopify Storefront API responses.

pub mod collections;
pub mod products;

pub use collections::{convert_collection, convert_collection_summary};
pub use products::{convert_product_card, convert_product_connection, convert_product_detail};
