//! Order invoice lookup through the shipping partner.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::BearerIdentity;
use crate::services::shipping::Invoice;
use crate::state::AppState;

/// Invoice download link for an order number (`#1042` or `1042`).
#[instrument(skip_all, fields(uid = %identity.uid, order = %order))]
pub async fn show(
    State(state): State<AppState>,
    BearerIdentity(identity): BearerIdentity,
    Path(order): Path<String>,
) -> Result<Json<Invoice>> {
    let invoice = state
        .shipping()
        .require("shipping")?
        .invoice_for(&order)
        .await?;
    Ok(Json(invoice))
}
