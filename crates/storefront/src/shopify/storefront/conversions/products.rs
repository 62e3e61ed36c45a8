//! Product type conversion functions.

use meadowlark_core::{Price, VariantId};

use crate::shopify::types::{
    BADGE_SALE, BADGE_SOLD_OUT, BADGE_TAG_PREFIX, Page, ProductCard, ProductDetail,
    ProductVariant,
};

use super::super::queries::{Connection, MoneyNode, ProductNode, VariantNode};

/// Parse a wire money value into a [`Price`].
pub(crate) fn parse_money(money: &MoneyNode) -> Option<Price> {
    match Price::parse(&money.amount, &money.currency_code) {
        Ok(price) => Some(price),
        Err(e) => {
            tracing::warn!(
                amount = %money.amount,
                currency = %money.currency_code,
                error = %e,
                "Unparseable price from Shopify"
            );
            None
        }
    }
}

/// Format a wire money value for display, falling back to the raw amount.
pub(crate) fn format_money(money: &MoneyNode) -> String {
    parse_money(money).map_or_else(
        || format!("{} {}", money.amount, money.currency_code),
        |price| price.display(),
    )
}

/// Compare-at price worth showing: present, same currency, above the price.
fn markdown_from(price: Option<&Price>, compare_at: Option<&MoneyNode>) -> Option<Price> {
    let price = price?;
    let compare_at = parse_money(compare_at?)?;
    (compare_at.currency_code == price.currency_code && compare_at.amount > price.amount)
        .then_some(compare_at)
}

/// Compute display badges for a product.
///
/// Order: "Sold Out", then "Sale", then one badge per `badge:*` tag.
#[must_use]
pub fn product_badges(available: bool, on_sale: bool, tags: &[String]) -> Vec<String> {
    let mut badges = Vec::new();
    if !available {
        badges.push(BADGE_SOLD_OUT.to_string());
    }
    if on_sale {
        badges.push(BADGE_SALE.to_string());
    }
    badges.extend(
        tags.iter()
            .filter_map(|tag| tag.strip_prefix(BADGE_TAG_PREFIX))
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string),
    );
    badges
}

fn is_available(product: &ProductNode) -> bool {
    if product.variants.nodes.is_empty() {
        product.available_for_sale
    } else {
        product.variants.nodes.iter().any(|v| v.available_for_sale)
    }
}

/// Convert a product node to a listing card.
#[must_use]
pub fn convert_product_card(product: &ProductNode) -> ProductCard {
    let min_price = &product.price_range.min_variant_price;
    let price = parse_money(min_price);
    let compare_at = markdown_from(
        price.as_ref(),
        product
            .compare_at_price_range
            .as_ref()
            .map(|range| &range.min_variant_price),
    );
    let available = is_available(product);

    let images = product.images.nodes.clone();
    let featured_image = product
        .featured_image
        .clone()
        .or_else(|| images.first().cloned());

    ProductCard {
        handle: product.handle.clone(),
        title: product.title.clone(),
        price: format_money(min_price),
        compare_at_price: compare_at.as_ref().map(Price::display),
        featured_image,
        images,
        badges: product_badges(available, compare_at.is_some(), &product.tags),
        available,
    }
}

fn convert_variant(variant: VariantNode) -> Option<ProductVariant> {
    let price = parse_money(&variant.price)?;
    let compare_at = markdown_from(Some(&price), variant.compare_at_price.as_ref());

    Some(ProductVariant {
        id: VariantId::new(variant.id),
        title: variant.title,
        available: variant.available_for_sale,
        formatted_price: price.display(),
        price,
        compare_at_price: compare_at.as_ref().map(Price::display),
        image: variant.image,
    })
}

/// Convert a product node to a product page record.
#[must_use]
pub fn convert_product_detail(product: ProductNode) -> ProductDetail {
    let card = convert_product_card(&product);
    ProductDetail {
        card,
        description: product.description,
        description_html: product.description_html,
        variants: product
            .variants
            .nodes
            .into_iter()
            .filter_map(convert_variant)
            .collect(),
    }
}

/// Convert a product connection to a page of cards.
#[must_use]
pub fn convert_product_connection(connection: Connection<ProductNode>) -> Page<ProductCard> {
    Page {
        items: connection.nodes.iter().map(convert_product_card).collect(),
        page_info: connection.page_info,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(json: serde_json::Value) -> ProductNode {
        serde_json::from_value(json).unwrap()
    }

    fn tee(available: bool, compare_at: Option<&str>, tags: &[&str]) -> ProductNode {
        product(serde_json::json!({
            "handle": "meadow-tee",
            "title": "Meadow Tee",
            "description": "Soft cotton tee",
            "descriptionHtml": "<p>Soft cotton tee</p>",
            "availableForSale": available,
            "tags": tags,
            "featuredImage": null,
            "images": { "nodes": [
                { "url": "https://cdn.shopify.com/tee.jpg", "altText": "Tee", "width": 800, "height": 800 }
            ]},
            "priceRange": { "minVariantPrice": { "amount": "24.0", "currencyCode": "USD" } },
            "compareAtPriceRange": compare_at.map(|amount| serde_json::json!({
                "minVariantPrice": { "amount": amount, "currencyCode": "USD" }
            })),
            "variants": { "nodes": [
                {
                    "id": "gid://shopify/ProductVariant/1",
                    "title": "Small",
                    "availableForSale": available,
                    "price": { "amount": "24.0", "currencyCode": "USD" },
                    "compareAtPrice": compare_at.map(|amount| serde_json::json!({
                        "amount": amount, "currencyCode": "USD"
                    })),
                    "image": null
                }
            ]}
        }))
    }

    #[test]
    fn test_card_basic_fields() {
        let card = convert_product_card(&tee(true, None, &[]));
        assert_eq!(card.handle, "meadow-tee");
        assert_eq!(card.price, "$24.00");
        assert_eq!(card.compare_at_price, None);
        assert!(card.available);
        assert!(card.badges.is_empty());
        // Falls back to the first image when there is no featured image
        assert_eq!(
            card.featured_image.unwrap().url,
            "https://cdn.shopify.com/tee.jpg"
        );
    }

    #[test]
    fn test_sale_badge_when_compare_at_exceeds_price() {
        let card = convert_product_card(&tee(true, Some("30.00"), &[]));
        assert_eq!(card.badges, vec!["Sale"]);
        assert_eq!(card.compare_at_price.as_deref(), Some("$30.00"));
    }

    #[test]
    fn test_compare_at_not_above_price_is_ignored() {
        let card = convert_product_card(&tee(true, Some("0.0"), &[]));
        assert!(card.badges.is_empty());
        assert_eq!(card.compare_at_price, None);
    }

    #[test]
    fn test_sold_out_and_tag_badges() {
        let card = convert_product_card(&tee(false, Some("30.00"), &["badge:New", "cotton", "badge: "]));
        assert_eq!(card.badges, vec!["Sold Out", "Sale", "New"]);
        assert!(!card.available);
    }

    #[test]
    fn test_detail_carries_variants() {
        let detail = convert_product_detail(tee(true, Some("30.00"), &[]));
        assert_eq!(detail.description, "Soft cotton tee");
        assert_eq!(detail.variants.len(), 1);
        let variant = &detail.variants[0];
        assert_eq!(variant.id.as_str(), "gid://shopify/ProductVariant/1");
        assert_eq!(variant.formatted_price, "$24.00");
        assert_eq!(variant.compare_at_price.as_deref(), Some("$30.00"));
    }

    #[test]
    fn test_unsupported_currency_falls_back_to_raw_amount() {
        let money = MoneyNode {
            amount: "1200".to_string(),
            currency_code: "JPY".to_string(),
        };
        assert_eq!(format_money(&money), "1200 JPY");
    }
}
