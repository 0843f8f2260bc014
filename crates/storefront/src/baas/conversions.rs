//! Normalization of raw Supabase rows into domain types.
//!
//! Rows that cannot become a valid domain value are logged and skipped;
//! the rest of the batch is kept.

use std::collections::BTreeMap;

use ruway_core::{
    Category, CategoryId, PLACEHOLDER_IMAGE, Price, Product, ProductId, StockStatus,
    StoreSettings,
};
use thiserror::Error;

use super::types::{CategoryRow, ProductRow, SettingsRow};

/// Why a row was not turned into a domain value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowRejection {
    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error("price is negative")]
    NegativePrice,
    #[error("row does not match the expected shape: {0}")]
    Shape(String),
}

// =============================================================================
// Products
// =============================================================================

/// Normalize a batch of raw `products` rows, skipping the ones that fail.
#[must_use]
pub fn normalize_products(rows: Vec<serde_json::Value>) -> Vec<Product> {
    rows.into_iter()
        .filter_map(|value| {
            let row = serde_json::from_value::<ProductRow>(value)
                .map_err(|e| RowRejection::Shape(e.to_string()));
            match row.and_then(normalize_product) {
                Ok(product) => Some(product),
                Err(reason) => {
                    tracing::warn!(%reason, "Rejected product row");
                    None
                }
            }
        })
        .collect()
}

/// Convert one `products` row.
///
/// # Errors
///
/// Returns `RowRejection` if `id`, `name`, `price` or `sku` is missing, or
/// the price is negative.
pub fn normalize_product(row: ProductRow) -> Result<Product, RowRejection> {
    let id = required(row.id, "id")?;
    let name = required(row.name, "name")?;
    let sku = required(row.sku, "sku")?;
    let price = row.price.ok_or(RowRejection::MissingColumn("price"))?;
    if price.is_sign_negative() {
        return Err(RowRejection::NegativePrice);
    }

    let stock_status = match row.stock_status.as_deref().and_then(StockStatus::parse) {
        Some(status) => status,
        None => {
            tracing::warn!(
                product_id = %id,
                stock_status = ?row.stock_status,
                "Missing or unknown stock status, treating product as out of stock"
            );
            StockStatus::OutOfStock
        }
    };

    let specs = row.specs.and_then(|value| {
        let parsed = flat_string_map(&value);
        if parsed.is_none() && !value.is_null() {
            tracing::warn!(product_id = %id, "Dropping specs that are not a flat string map");
        }
        parsed
    });

    Ok(Product {
        id: ProductId::new(id),
        name,
        description: row.description.unwrap_or_default(),
        price: Price::new(price),
        original_price: row
            .original_price
            .filter(|p| !p.is_sign_negative())
            .map(Price::new),
        image: non_blank(row.image).unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        images: non_empty_list(row.images),
        category: row
            .categories
            .and_then(|c| non_blank(c.slug))
            .unwrap_or_default(),
        sku,
        stock_status,
        specs,
        features: non_empty_list(row.features),
    })
}

/// Read a JSON object of scalar values as a string map.
///
/// Numbers and booleans are stringified; nested values make the whole map
/// invalid.
fn flat_string_map(value: &serde_json::Value) -> Option<BTreeMap<String, String>> {
    let object = value.as_object()?;
    object
        .iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), text))
        })
        .collect()
}

// =============================================================================
// Categories & Settings
// =============================================================================

/// Normalize a batch of `categories` rows, skipping the ones that fail.
#[must_use]
pub fn normalize_categories(rows: Vec<CategoryRow>) -> Vec<Category> {
    rows.into_iter()
        .filter_map(|row| match normalize_category(row) {
            Ok(category) => Some(category),
            Err(reason) => {
                tracing::warn!(%reason, "Rejected category row");
                None
            }
        })
        .collect()
}

/// Convert one `categories` row.
///
/// # Errors
///
/// Returns `RowRejection::MissingColumn` if `id`, `name` or `slug` is missing.
pub fn normalize_category(row: CategoryRow) -> Result<Category, RowRejection> {
    Ok(Category {
        id: CategoryId::new(required(row.id, "id")?),
        name: required(row.name, "name")?,
        image: non_blank(row.image).unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        slug: required(row.slug, "slug")?,
    })
}

/// Convert the first `settings` row, falling back to defaults.
#[must_use]
pub fn normalize_settings(row: Option<SettingsRow>) -> StoreSettings {
    let Some(row) = row else {
        return StoreSettings::default();
    };
    let defaults = StoreSettings::default();
    StoreSettings {
        company_name: non_blank(row.company_name).unwrap_or(defaults.company_name),
        company_slogan: non_blank(row.company_slogan),
        phone: non_blank(row.phone),
        email: non_blank(row.email),
        address: non_blank(row.address),
        website: non_blank(row.website),
        yape_qr: non_blank(row.yape_qr),
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required(value: Option<String>, column: &'static str) -> Result<String, RowRejection> {
    non_blank(value).ok_or(RowRejection::MissingColumn(column))
}

fn non_empty_list(values: Option<Vec<String>>) -> Option<Vec<String>> {
    values
        .map(|list| {
            list.into_iter()
                .filter(|s| !s.trim().is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|list| !list.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> ProductRow {
        serde_json::from_value(value).unwrap()
    }

    fn complete_row() -> serde_json::Value {
        json!({
            "id": "a1",
            "name": "ESP32 DevKit",
            "description": "WiFi and Bluetooth board",
            "price": 55,
            "original_price": 65,
            "image": "https://cdn.ruway.pe/esp32.png",
            "images": ["https://cdn.ruway.pe/esp32-1.png", ""],
            "sku": "001011",
            "stock_status": "En Stock",
            "specs": {"Voltaje": "3.3V", "Pines": 38},
            "features": ["WiFi", "Bluetooth"],
            "categories": {"slug": "microcontroladores"}
        })
    }

    #[test]
    fn test_normalize_complete_row() {
        let product = normalize_product(row(complete_row())).unwrap();
        assert_eq!(product.id.as_str(), "a1");
        assert_eq!(product.price, Price::from_cents(5500));
        assert_eq!(product.original_price, Some(Price::from_cents(6500)));
        assert_eq!(product.images.as_deref(), Some(&["https://cdn.ruway.pe/esp32-1.png".to_string()][..]));
        assert_eq!(product.category, "microcontroladores");
        assert_eq!(product.stock_status, StockStatus::InStock);
        let specs = product.specs.unwrap();
        assert_eq!(specs.get("Pines").map(String::as_str), Some("38"));
    }

    #[test]
    fn test_missing_required_columns_are_rejected() {
        for column in ["id", "name", "price", "sku"] {
            let mut value = complete_row();
            value.as_object_mut().unwrap().remove(column);
            assert_eq!(
                normalize_product(row(value)),
                Err(RowRejection::MissingColumn(column)),
                "column {column}"
            );
        }
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let mut value = complete_row();
        value["name"] = json!("   ");
        assert_eq!(
            normalize_product(row(value)),
            Err(RowRejection::MissingColumn("name"))
        );
    }

    #[test]
    fn test_missing_image_uses_placeholder() {
        let mut value = complete_row();
        value["image"] = serde_json::Value::Null;
        assert_eq!(normalize_product(row(value)).unwrap().image, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_missing_or_unknown_stock_status_is_out_of_stock() {
        let mut value = complete_row();
        value.as_object_mut().unwrap().remove("stock_status");
        assert_eq!(
            normalize_product(row(value)).unwrap().stock_status,
            StockStatus::OutOfStock
        );

        let mut value = complete_row();
        value["stock_status"] = json!("Pronto");
        assert_eq!(
            normalize_product(row(value)).unwrap().stock_status,
            StockStatus::OutOfStock
        );
    }

    #[test]
    fn test_nested_specs_are_dropped() {
        let mut value = complete_row();
        value["specs"] = json!({"Dimensiones": {"alto": 5}});
        let product = normalize_product(row(value)).unwrap();
        assert!(product.specs.is_none());

        let mut value = complete_row();
        value["specs"] = json!(["not", "a", "map"]);
        assert!(normalize_product(row(value)).unwrap().specs.is_none());
    }

    #[test]
    fn test_normalize_products_skips_bad_rows() {
        let rows = vec![
            complete_row(),
            json!({"id": "b2", "name": "No price", "sku": "x"}),
            json!({"id": "c3", "name": "Bad price", "sku": "y", "price": "abc"}),
            json!("not an object"),
        ];
        let products = normalize_products(rows);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id.as_str(), "a1");
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let mut value = complete_row();
        value["price"] = json!(-1);
        assert_eq!(normalize_product(row(value)), Err(RowRejection::NegativePrice));
    }

    #[test]
    fn test_normalize_categories() {
        let rows = vec![
            CategoryRow {
                id: Some("1".to_string()),
                name: Some("Microcontroladores".to_string()),
                image: None,
                slug: Some("microcontroladores".to_string()),
            },
            CategoryRow {
                id: Some("2".to_string()),
                name: Some("Sin slug".to_string()),
                image: None,
                slug: None,
            },
        ];
        let categories = normalize_categories(rows);
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].image, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_normalize_settings_defaults() {
        assert_eq!(normalize_settings(None), StoreSettings::default());

        let settings = normalize_settings(Some(SettingsRow {
            company_name: Some(" ".to_string()),
            yape_qr: Some("https://cdn.ruway.pe/yape.png".to_string()),
            ..SettingsRow::default()
        }));
        assert_eq!(settings.company_name, StoreSettings::default().company_name);
        assert_eq!(settings.yape_qr.as_deref(), Some("https://cdn.ruway.pe/yape.png"));
    }
}
