//! Shopify Storefront API client.
//!
//! Shopify is the source of truth for the catalogue and for customer
//! accounts; nothing is synced locally. Catalogue responses are cached in
//! memory via `moka` (5 minute TTL).
//!
//! The storefront reaches Shopify for:
//! - products by handle and product pages (cursor + page size)
//! - collections and collection pages with their products
//! - customer access tokens (create, delete), customer creation and lookup
//!
//! Wire responses are reshaped into display records ([`ProductCard`],
//! [`ProductDetail`], [`Collection`]) before they leave this module.

mod storefront;
pub mod types;

pub use storefront::StorefrontClient;
pub use types::*;

use thiserror::Error;

/// Errors from the Storefront API client.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-success status.
    #[error("Shopify returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response carried GraphQL errors, one description each.
    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQL(Vec<String>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A well-formed response without the expected payload.
    #[error("Empty {0} response")]
    EmptyResponse(&'static str),

    /// Product or collection handle did not match.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Throttled; retry after this many seconds.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Shopify refused the customer input (bad credentials, taken email).
    #[error("User error: {0}")]
    UserError(String),

    /// The customer access token was rejected or has expired.
    #[error("Customer token rejected")]
    InvalidCustomerToken,
}
