//! Pure catalog queries.
//!
//! The storefront fetches rows from the backend and hands the normalized
//! products to these helpers. Search is plain case-insensitive substring
//! matching over name and description; there is no ranking, results keep
//! catalog order.

use crate::types::{Product, ProductId};

/// Products whose name or description contains `query`, ignoring case.
///
/// A blank query matches everything.
#[must_use]
pub fn search<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let needle = query.trim().to_lowercase();
    products
        .iter()
        .filter(|product| needle.is_empty() || product.matches_lowercase(&needle))
        .collect()
}

/// Products in the category with the given slug.
#[must_use]
pub fn in_category<'a>(products: &'a [Product], slug: &str) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|product| product.category == slug)
        .collect()
}

/// Find a product by id, falling back to its SKU.
///
/// Storefront links use either key, so a miss on id is retried against SKU
/// before giving up.
#[must_use]
pub fn find_by_id_or_sku<'a>(products: &'a [Product], key: &str) -> Option<&'a Product> {
    let id = ProductId::new(key);
    products
        .iter()
        .find(|product| product.id == id)
        .or_else(|| products.iter().find(|product| product.sku == key))
}
