//! Status enums for catalog and order entities.

use serde::{Deserialize, Serialize};

/// Availability of a product.
///
/// The backend stores this as free text (`"En Stock"` / `"Agotado"` in the
/// seeded catalog); [`StockStatus::parse`] accepts those labels as well as
/// the snake-case form used in serialized cart snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
}

impl StockStatus {
    /// Parse a backend label. Returns `None` for anything unrecognized.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "en stock" | "in stock" | "in_stock" | "instock" | "disponible" => Some(Self::InStock),
            "agotado" | "out of stock" | "out_of_stock" | "outofstock" | "sin stock" => {
                Some(Self::OutOfStock)
            }
            _ => None,
        }
    }

    /// Whether the product can currently be bought.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::InStock)
    }

    /// Storefront label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InStock => "En Stock",
            Self::OutOfStock => "Agotado",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Order status recorded for a completed checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// Payment status recorded for a completed checkout.
///
/// Manual QR payments are confirmed by the customer, not by a gateway, so a
/// fresh order always starts as `Pending` until staff reconcile it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
}
