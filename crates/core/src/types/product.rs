//! Catalog shapes: products and categories.
//!
//! These are the validated forms; raw backend rows are normalized into them
//! by the storefront before anything else sees them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::Price;
use super::status::StockStatus;

/// Image path used when the backend has no image for a product or category.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// A catalog product.
///
/// Embedded by value into cart lines, so a cart snapshot keeps the price the
/// customer saw when adding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Pre-discount price shown struck through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Price>,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Category slug.
    pub category: String,
    pub sku: String,
    pub stock_status: StockStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specs: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

impl Product {
    /// Whether `query` (already lowercased) appears in the name or description.
    #[must_use]
    pub fn matches_lowercase(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query) || self.description.to_lowercase().contains(query)
    }

    /// Whether the product carries a discount over its original price.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.original_price.is_some_and(|original| original > self.price)
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub image: String,
    pub slug: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new("001011"),
            name: "ESP32-DevKitC V4".to_string(),
            description: "Tarjeta de desarrollo WiFi y Bluetooth".to_string(),
            price: Price::from_cents(5500),
            original_price: Some(Price::from_cents(6500)),
            image: PLACEHOLDER_IMAGE.to_string(),
            images: None,
            category: "microcontroladores".to_string(),
            sku: "001011".to_string(),
            stock_status: StockStatus::InStock,
            specs: None,
            features: Some(vec!["Conector micro-USB".to_string()]),
        }
    }

    #[test]
    fn test_matches_name_and_description() {
        let p = product();
        assert!(p.matches_lowercase("esp32"));
        assert!(p.matches_lowercase("bluetooth"));
        assert!(!p.matches_lowercase("arduino"));
    }

    #[test]
    fn test_is_discounted() {
        let mut p = product();
        assert!(p.is_discounted());
        p.original_price = None;
        assert!(!p.is_discounted());
    }

    #[test]
    fn test_serializes_camel_case_and_skips_empty_optionals() {
        let json = serde_json::to_value(product()).unwrap();
        assert_eq!(json["stockStatus"], "in_stock");
        assert!(json.get("originalPrice").is_some());
        assert!(json.get("specs").is_none());
    }
}
