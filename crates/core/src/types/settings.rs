//! Store-wide settings shown around the storefront.

use serde::{Deserialize, Serialize};

/// Company name used when the backend has no settings row.
pub const DEFAULT_COMPANY_NAME: &str = "Ruway Electronics";

/// Contact details and payment assets for the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_slogan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Image URL of the Yape QR code customers scan to pay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yape_qr: Option<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            company_slogan: None,
            phone: None,
            email: None,
            address: None,
            website: None,
            yape_qr: None,
        }
    }
}
