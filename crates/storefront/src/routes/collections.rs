//! Collection API handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use super::products::PageQuery;
use crate::error::Result;
use crate::shopify::types::{Collection, CollectionSummary, Page};
use crate::state::AppState;

/// One page of collections.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<CollectionSummary>>> {
    let page = state
        .storefront()
        .get_collections(query.first, query.after)
        .await?;
    Ok(Json(page))
}

/// A collection with one page of its products.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Collection>> {
    let collection = state
        .storefront()
        .get_collection_by_handle(&handle, query.first, query.after)
        .await?;
    Ok(Json(collection))
}
