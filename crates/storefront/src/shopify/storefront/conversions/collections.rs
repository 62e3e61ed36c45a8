//! Collection type conversion functions.

use crate::shopify::types::{Collection, CollectionSummary};

use super::super::queries::{CollectionNode, CollectionWithProductsNode};
use super::products::convert_product_connection;

/// Convert a collection node to its navigation summary.
#[must_use]
pub fn convert_collection_summary(collection: CollectionNode) -> CollectionSummary {
    CollectionSummary {
        handle: collection.handle,
        title: collection.title,
        description: collection.description,
        image: collection.image,
    }
}

/// Convert a collection node with products to a collection page.
#[must_use]
pub fn convert_collection(collection: CollectionWithProductsNode) -> Collection {
    Collection {
        summary: convert_collection_summary(collection.collection),
        products: convert_product_connection(collection.products),
    }
}
