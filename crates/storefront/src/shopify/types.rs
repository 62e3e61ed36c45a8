//! Display records built from Storefront API responses.
//!
//! These are what routes serialize and templates render. Prices are already
//! formatted for display; the cart keeps its own [`Price`] snapshot.

use meadowlark_core::{Price, VariantId};
use serde::{Deserialize, Serialize};

/// Badge for products with no purchasable variant.
pub const BADGE_SOLD_OUT: &str = "Sold Out";
/// Badge for products priced below their compare-at price.
pub const BADGE_SALE: &str = "Sale";
/// Product tag prefix that adds a custom badge (`badge:New` → "New").
pub const BADGE_TAG_PREFIX: &str = "badge:";

/// An image hosted on Shopify's CDN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub url: String,
    pub alt_text: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// Cursor pagination state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

/// A product as shown in grids and listings.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCard {
    pub handle: String,
    pub title: String,
    /// Lowest variant price, formatted (e.g. "$24.00").
    pub price: String,
    /// Compare-at price, formatted, when the product has one.
    pub compare_at_price: Option<String>,
    pub featured_image: Option<Image>,
    pub images: Vec<Image>,
    /// Display badges in priority order.
    pub badges: Vec<String>,
    pub available: bool,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, Serialize)]
pub struct ProductVariant {
    pub id: VariantId,
    pub title: String,
    pub available: bool,
    /// Price snapshot, as the cart stores it.
    pub price: Price,
    pub formatted_price: String,
    pub compare_at_price: Option<String>,
    pub image: Option<Image>,
}

/// A product page.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub card: ProductCard,
    pub description: String,
    pub description_html: String,
    pub variants: Vec<ProductVariant>,
}

/// A collection as listed in navigation.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
    pub handle: String,
    pub title: String,
    pub description: String,
    pub image: Option<Image>,
}

/// A collection page with one page of its products.
#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    #[serde(flatten)]
    pub summary: CollectionSummary,
    pub products: Page<ProductCard>,
}

/// A Shopify customer account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Opaque customer access token issued on login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAccessToken {
    pub access_token: String,
    pub expires_at: String,
}

/// Fields accepted when registering a customer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreateInput {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub accepts_marketing: bool,
}
