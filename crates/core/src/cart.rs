//! The cart store.
//!
//! A [`CartStore`] is the authoritative view of "what is in the cart right
//! now" for one browser session: an ordered list of [`CartLine`]s plus the
//! open/closed state of the cart drawer. Every mutation is synchronous and
//! infallible; asking for something that is not there is a no-op.
//!
//! # Invariants
//!
//! - at most one line per [`VariantId`]
//! - every line has `quantity >= 1`
//! - lines keep the order in which their id was first added
//! - every line is priced in the same currency
//!
//! The store owns no global state. The storefront keeps one per session and
//! hands it to handlers explicitly.
//!
//! ```
//! use meadowlark_core::{CartStore, NewCartLine, Price, VariantId};
//!
//! let mut cart = CartStore::new();
//! let line = NewCartLine::new("v1", "Lavender Soap", Price::parse("10", "USD").unwrap());
//! cart.add_item(line.clone());
//! cart.add_item(line);
//!
//! assert_eq!(cart.item_count(), 2);
//! assert_eq!(cart.total().display(), "$20.00");
//! assert!(cart.is_open());
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{CurrencyCode, Price, VariantId};

/// A line to add to the cart: everything except the quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartLine {
    /// Remote variant identifier (de-duplication key).
    pub id: VariantId,
    /// Product title at the time of adding.
    pub title: String,
    /// Image URL for the drawer thumbnail.
    #[serde(default)]
    pub image: Option<String>,
    /// Variant label (e.g. "250 ml"), if the product has options.
    #[serde(default)]
    pub variant: Option<String>,
    /// Unit price snapshot.
    pub price: Price,
}

impl NewCartLine {
    /// Convenience constructor without image or variant label.
    #[must_use]
    pub fn new(id: impl Into<VariantId>, title: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image: None,
            variant: None,
            price,
        }
    }
}

/// One distinct purchasable variant in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Remote variant identifier (de-duplication key).
    pub id: VariantId,
    /// Product title captured when the line was created.
    pub title: String,
    /// Image URL captured when the line was created.
    pub image: Option<String>,
    /// Variant label captured when the line was created.
    pub variant: Option<String>,
    /// Unit price captured when the line was created.
    pub price: Price,
    /// Number of units, always at least 1.
    pub quantity: u32,
}

impl CartLine {
    fn from_new(line: NewCartLine) -> Self {
        Self {
            id: line.id,
            title: line.title,
            image: line.image,
            variant: line.variant,
            price: line.price,
            quantity: 1,
        }
    }

    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Line items plus drawer visibility for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartStore {
    lines: Vec<CartLine>,
    is_open: bool,
}

impl CartStore {
    /// An empty cart with the drawer closed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            is_open: false,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of a variant.
    ///
    /// An existing line for the same id is incremented in place (its display
    /// metadata and price snapshot are kept); otherwise a new line with
    /// quantity 1 is appended. The drawer is opened either way.
    ///
    /// A line priced in a different currency than the cart's is ignored; see
    /// [`CartStore::accepts`].
    pub fn add_item(&mut self, line: NewCartLine) {
        if !self.accepts(&line) {
            return;
        }
        match self.position(&line.id) {
            Some(index) => {
                if let Some(existing) = self.lines.get_mut(index) {
                    existing.quantity = existing.quantity.saturating_add(1);
                }
            }
            None => self.lines.push(CartLine::from_new(line)),
        }
        self.is_open = true;
    }

    /// Remove the line for `id`, if any.
    pub fn remove_item(&mut self, id: &VariantId) {
        self.lines.retain(|line| &line.id != id);
    }

    /// Set the quantity of the line for `id`.
    ///
    /// A quantity of zero or less removes the line. Unknown ids are ignored.
    pub fn update_quantity(&mut self, id: &VariantId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|line| &line.id == id) {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    /// Flip the drawer between open and closed.
    pub const fn toggle_cart(&mut self) {
        self.is_open = !self.is_open;
    }

    /// Open the drawer.
    pub const fn open_cart(&mut self) {
        self.is_open = true;
    }

    /// Close the drawer.
    pub const fn close_cart(&mut self) {
        self.is_open = false;
    }

    /// Empty the cart and close the drawer.
    pub fn clear_cart(&mut self) {
        self.lines.clear();
        self.is_open = false;
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lines in first-added order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn line(&self, id: &VariantId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    /// Whether the drawer is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    /// Currency of the lines, or `None` for an empty cart.
    #[must_use]
    pub fn currency(&self) -> Option<CurrencyCode> {
        self.lines.first().map(|line| line.price.currency_code)
    }

    /// Whether `line` can join this cart: it is empty or already priced in
    /// the same currency.
    #[must_use]
    pub fn accepts(&self, line: &NewCartLine) -> bool {
        self.currency()
            .is_none_or(|currency| currency == line.price.currency_code)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of `price × quantity` over all lines.
    ///
    /// Recomputed on every call; saturates rather than overflowing. An empty
    /// cart totals zero in the default currency.
    #[must_use]
    pub fn total(&self) -> Price {
        let currency = self.currency().unwrap_or_default();

        self.lines
            .iter()
            .fold(Price::zero(currency), |acc, line| acc.plus(&line.line_total()))
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    fn position(&self, id: &VariantId) -> Option<usize> {
        self.lines.iter().position(|line| &line.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn usd(amount: i64) -> Price {
        Price::new(Decimal::from(amount), CurrencyCode::USD)
    }

    fn line(id: &str, amount: i64) -> NewCartLine {
        NewCartLine::new(id, format!("Product {id}"), usd(amount))
    }

    fn summary(cart: &CartStore) -> Vec<(&str, u32)> {
        cart.lines()
            .iter()
            .map(|l| (l.id.as_str(), l.quantity))
            .collect()
    }

    #[test]
    fn test_new_cart_is_empty_and_closed() {
        let cart = CartStore::new();
        assert!(cart.is_empty());
        assert!(!cart.is_open());
        assert_eq!(cart.item_count(), 0);
        assert!(cart.total().is_zero());
    }

    #[test]
    fn test_add_merges_by_id_and_opens_drawer() {
        let mut cart = CartStore::new();
        cart.add_item(line("v1", 10));
        cart.add_item(line("v1", 10));
        cart.add_item(line("v2", 5));

        assert_eq!(summary(&cart), vec![("v1", 2), ("v2", 1)]);
        assert_eq!(cart.total(), usd(25));
        assert_eq!(cart.item_count(), 3);
        assert!(cart.is_open());
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let mut cart = CartStore::new();
        cart.add_item(line("v1", 10));
        cart.add_item(line("v1", 10));
        cart.add_item(line("v2", 5));

        cart.update_quantity(&VariantId::new("v1"), 0);

        assert_eq!(summary(&cart), vec![("v2", 1)]);
        assert_eq!(cart.total(), usd(5));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_re_add_keeps_position_and_snapshot() {
        let mut cart = CartStore::new();
        cart.add_item(line("a", 3));
        cart.add_item(line("b", 4));

        // Same id, different price: the original snapshot wins.
        cart.add_item(line("a", 99));

        assert_eq!(summary(&cart), vec![("a", 2), ("b", 1)]);
        assert_eq!(cart.line(&"a".into()).unwrap().price, usd(3));
    }

    #[test]
    fn test_add_opens_even_after_close() {
        let mut cart = CartStore::new();
        cart.add_item(line("a", 1));
        cart.close_cart();
        cart.add_item(line("a", 1));
        assert!(cart.is_open());
    }

    #[test]
    fn test_update_sets_absolute_quantity() {
        let mut cart = CartStore::new();
        cart.add_item(line("a", 2));
        cart.update_quantity(&"a".into(), 7);
        assert_eq!(cart.line(&"a".into()).unwrap().quantity, 7);
        assert_eq!(cart.total(), usd(14));

        cart.update_quantity(&"a".into(), -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_missing_ids_are_noops() {
        let mut cart = CartStore::new();
        cart.add_item(line("a", 2));
        let before = cart.clone();

        cart.remove_item(&"zzz".into());
        cart.update_quantity(&"zzz".into(), 4);

        assert_eq!(cart, before);
    }

    #[test]
    fn test_visibility_controls() {
        let mut cart = CartStore::new();
        cart.toggle_cart();
        assert!(cart.is_open());
        cart.toggle_cart();
        assert!(!cart.is_open());
        cart.open_cart();
        cart.open_cart();
        assert!(cart.is_open());
        cart.close_cart();
        assert!(!cart.is_open());
    }

    #[test]
    fn test_clear_empties_and_closes() {
        let mut cart = CartStore::new();
        cart.add_item(line("a", 2));
        cart.add_item(line("b", 3));
        cart.clear_cart();

        assert!(cart.is_empty());
        assert!(!cart.is_open());
        assert_eq!(cart.item_count(), 0);
        assert!(cart.total().is_zero());
    }

    #[test]
    fn test_total_uses_line_currency() {
        let mut cart = CartStore::new();
        cart.add_item(NewCartLine::new(
            "a",
            "Kumkumadi Oil",
            Price::parse("499.00", "INR").unwrap(),
        ));
        assert_eq!(cart.total().display(), "₹499.00");
    }

    #[test]
    fn test_other_currency_is_not_mixed_in() {
        let mut cart = CartStore::new();
        cart.add_item(line("a", 10));
        cart.close_cart();

        let rupees = NewCartLine::new("b", "Kumkumadi Oil", Price::parse("1000", "INR").unwrap());
        assert!(!cart.accepts(&rupees));
        cart.add_item(rupees);

        assert_eq!(summary(&cart), vec![("a", 1)]);
        assert_eq!(cart.total().display(), "$10.00");
        assert!(!cart.is_open());

        cart.clear_cart();
        assert!(cart.accepts(&NewCartLine::new("b", "Oil", Price::parse("1", "INR").unwrap())));
    }

    #[test]
    fn test_total_of_huge_amounts_does_not_overflow() {
        let mut cart = CartStore::new();
        let huge = Price::parse("50000000000000000000000000000", "USD").unwrap();
        cart.add_item(NewCartLine::new("a", "Gold Soap", huge));
        cart.add_item(NewCartLine::new("a", "Gold Soap", huge));
        cart.add_item(NewCartLine::new("b", "Gold Balm", huge));
        assert_eq!(cart.total().amount, Decimal::MAX);

        cart.update_quantity(&"b".into(), 4_000_000_000);
        assert_eq!(cart.total().amount, Decimal::MAX);
        assert_eq!(cart.line(&"b".into()).unwrap().line_total().amount, Decimal::MAX);
    }

    #[test]
    fn test_serde_roundtrip_preserves_order_and_visibility() {
        let mut cart = CartStore::new();
        cart.add_item(line("b", 1));
        cart.add_item(line("a", 1));

        let json = serde_json::to_string(&cart).unwrap();
        let restored: CartStore = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, cart);
        assert_eq!(summary(&restored), vec![("b", 1), ("a", 1)]);
    }
}
