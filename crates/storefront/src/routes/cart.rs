//! Cart route handlers.
//!
//! The cart lives in the visitor's session as a serialized [`CartStore`].
//! Every handler loads it, applies one store operation and writes it back;
//! the JSON endpoints answer with the full cart view so the client never has
//! to recompute totals.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use meadowlark_core::{CartStore, NewCartLine, VariantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::keys;

/// Largest unit price a cart line may carry.
const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Largest quantity a single line may be set to.
const MAX_LINE_QUANTITY: i64 = 999;

// =============================================================================
// Session Cart
// =============================================================================

/// The session's cart, loaded on extraction.
///
/// Mutations are local until [`SessionCart::save`] is called.
pub struct SessionCart {
    session: Session,
    cart: CartStore,
}

impl SessionCart {
    /// Load the cart from `session`, starting empty if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(session: Session) -> Result<Self> {
        let cart = session
            .get::<CartStore>(keys::CART)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read cart session: {e}")))?
            .unwrap_or_default();
        Ok(Self { session, cart })
    }

    /// Persist the cart back into the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn save(&self) -> Result<()> {
        self.session
            .insert(keys::CART, &self.cart)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to save cart session: {e}")))
    }

    /// Apply `op`, save, and return the resulting view.
    async fn apply(mut self, op: impl FnOnce(&mut CartStore)) -> Result<Json<CartView>> {
        op(&mut self.cart);
        let view = CartView::from(&self.cart);
        self.save().await?;
        Ok(Json(view))
    }

    /// The loaded cart.
    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }
}

impl<S> FromRequestParts<S> for SessionCart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(msg.to_string()))?;
        Self::load(session).await
    }
}

// =============================================================================
// Views
// =============================================================================

/// One cart line, with prices already formatted.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub id: String,
    pub title: String,
    pub image: Option<String>,
    pub variant: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub count: u32,
    pub is_open: bool,
}

impl From<&CartStore> for CartView {
    fn from(cart: &CartStore) -> Self {
        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| CartLineView {
                    id: line.id.as_str().to_string(),
                    title: line.title.clone(),
                    image: line.image.clone(),
                    variant: line.variant.clone(),
                    quantity: line.quantity,
                    price: line.price.display(),
                    line_total: line.line_total().display(),
                })
                .collect(),
            total: cart.total().display(),
            count: cart.item_count(),
            is_open: cart.is_open(),
        }
    }
}

/// Cart count badge.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

/// Quantity change request.
#[derive(Debug, Deserialize)]
pub struct QuantityUpdate {
    pub quantity: i64,
}

/// Reject lines the cart must not hold.
fn check_new_line(cart: &CartStore, line: &NewCartLine) -> Result<()> {
    let amount = line.price.amount;
    if amount.is_sign_negative() || amount > MAX_UNIT_PRICE {
        return Err(AppError::BadRequest(format!(
            "Price must be between 0 and {MAX_UNIT_PRICE}"
        )));
    }
    if !cart.accepts(line) {
        return Err(AppError::BadRequest(format!(
            "Cart is priced in {}",
            cart.currency().unwrap_or_default().code()
        )));
    }
    Ok(())
}

/// Cart drawer fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_drawer.html")]
pub struct CartDrawerTemplate {
    pub cart: CartView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Current cart as JSON.
#[instrument(skip_all)]
pub async fn show(cart: SessionCart) -> Json<CartView> {
    Json(CartView::from(cart.cart()))
}

/// Cart drawer HTML fragment.
#[instrument(skip_all)]
pub async fn drawer(cart: SessionCart) -> CartDrawerTemplate {
    CartDrawerTemplate {
        cart: CartView::from(cart.cart()),
    }
}

/// Cart count badge.
#[instrument(skip_all)]
pub async fn count(cart: SessionCart) -> Json<CartCount> {
    Json(CartCount {
        count: cart.cart().item_count(),
    })
}

/// Add one unit of a variant and open the drawer.
#[instrument(skip_all, fields(variant = %line.id.as_str()))]
pub async fn add(cart: SessionCart, Json(line): Json<NewCartLine>) -> Result<Json<CartView>> {
    check_new_line(cart.cart(), &line)?;
    cart.apply(|store| store.add_item(line)).await
}

/// Set a line's quantity; zero or less removes it.
#[instrument(skip(cart))]
pub async fn update(
    cart: SessionCart,
    Path(id): Path<String>,
    Json(update): Json<QuantityUpdate>,
) -> Result<Json<CartView>> {
    if update.quantity > MAX_LINE_QUANTITY {
        return Err(AppError::BadRequest(format!(
            "Quantity must be at most {MAX_LINE_QUANTITY}"
        )));
    }
    let id = VariantId::new(id);
    cart.apply(|store| store.update_quantity(&id, update.quantity))
        .await
}

/// Remove a line.
#[instrument(skip(cart))]
pub async fn remove(cart: SessionCart, Path(id): Path<String>) -> Result<Json<CartView>> {
    let id = VariantId::new(id);
    cart.apply(|store| store.remove_item(&id)).await
}

/// Empty the cart and close the drawer.
#[instrument(skip_all)]
pub async fn clear(cart: SessionCart) -> Result<Json<CartView>> {
    cart.apply(CartStore::clear_cart).await
}

/// Flip the drawer.
#[instrument(skip_all)]
pub async fn toggle(cart: SessionCart) -> Result<Json<CartView>> {
    cart.apply(CartStore::toggle_cart).await
}

/// Open the drawer.
#[instrument(skip_all)]
pub async fn open(cart: SessionCart) -> Result<Json<CartView>> {
    cart.apply(CartStore::open_cart).await
}

/// Close the drawer.
#[instrument(skip_all)]
pub async fn close(cart: SessionCart) -> Result<Json<CartView>> {
    cart.apply(CartStore::close_cart).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use meadowlark_core::Price;

    use super::*;

    #[test]
    fn test_cart_view_formats_totals() {
        let mut cart = CartStore::new();
        cart.add_item(NewCartLine::new("v1", "Soap", Price::parse("10", "USD").unwrap()));
        cart.add_item(NewCartLine::new("v1", "Soap", Price::parse("10", "USD").unwrap()));
        cart.add_item(NewCartLine::new("v2", "Balm", Price::parse("5", "USD").unwrap()));

        let view = CartView::from(&cart);
        assert_eq!(view.count, 3);
        assert_eq!(view.total, "$25.00");
        assert!(view.is_open);
        assert_eq!(view.lines[0].line_total, "$20.00");
        assert_eq!(view.lines[1].price, "$5.00");
    }

    #[test]
    fn test_check_new_line_limits() {
        let mut cart = CartStore::new();
        let soap = NewCartLine::new("v1", "Soap", Price::parse("10", "USD").unwrap());
        assert!(check_new_line(&cart, &soap).is_ok());
        cart.add_item(soap);

        let huge = NewCartLine::new("v2", "Gold", Price::parse("1000000.01", "USD").unwrap());
        assert!(matches!(check_new_line(&cart, &huge), Err(AppError::BadRequest(_))));

        let negative = NewCartLine::new("v3", "Refund", Price::parse("-1", "USD").unwrap());
        assert!(matches!(check_new_line(&cart, &negative), Err(AppError::BadRequest(_))));

        let euros = NewCartLine::new("v4", "Balm", Price::parse("5", "EUR").unwrap());
        let err = check_new_line(&cart, &euros).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Cart is priced in USD"));
    }

    #[test]
    fn test_drawer_renders_empty_state() {
        let html = CartDrawerTemplate {
            cart: CartView::from(&CartStore::new()),
        }
        .render()
        .unwrap();
        assert!(html.contains("Your cart is empty"));
    }

    #[test]
    fn test_drawer_lists_lines() {
        let mut cart = CartStore::new();
        cart.add_item(NewCartLine::new("v1", "Lavender Soap", Price::parse("10", "USD").unwrap()));

        let html = CartDrawerTemplate {
            cart: CartView::from(&cart),
        }
        .render()
        .unwrap();
        assert!(html.contains("Lavender Soap"));
        assert!(html.contains("$10.00"));
        assert!(html.contains("data-open=\"true\""));
    }
}
