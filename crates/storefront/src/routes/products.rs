//! Product API handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::shopify::types::{Page, ProductCard, ProductDetail};
use crate::state::AppState;

/// Cursor pagination query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Page size; clamped to what the commerce API accepts.
    pub first: Option<i64>,
    /// Cursor returned as `page_info.end_cursor` by the previous page.
    pub after: Option<String>,
}

/// One page of product cards.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<ProductCard>>> {
    let page = state.storefront().get_products(query.first, query.after).await?;
    Ok(Json(page))
}

/// A single product with its variants.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<ProductDetail>> {
    let product = state.storefront().get_product_by_handle(&handle).await?;
    Ok(Json(product))
}
