//! Raw Supabase row and auth payload shapes.
//!
//! Everything here is as loose as the tables allow: columns may be missing or
//! null, and ids may come back as strings or numbers. Nothing outside
//! [`super::conversions`] should use these directly.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// PostgREST rows
// =============================================================================

/// `products` row with the embedded `categories(slug)` relation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sku: Option<String>,
    #[serde(default)]
    pub stock_status: Option<String>,
    #[serde(default)]
    pub specs: Option<serde_json::Value>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub categories: Option<CategoryRef>,
}

/// Embedded category relation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryRef {
    #[serde(default)]
    pub slug: Option<String>,
}

/// `categories` row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// `settings` row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsRow {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_slogan: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub yape_qr: Option<String>,
}

/// `profiles` row (only the columns checkout needs).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileRow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dni: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

// =============================================================================
// GoTrue payloads
// =============================================================================

/// Body for `POST /token?grant_type=password`.
#[derive(Debug, Serialize)]
pub struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body for `POST /signup`.
#[derive(Debug, Serialize)]
pub struct SignUpRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: SignUpMetadata<'a>,
}

/// User metadata stored at sign-up.
#[derive(Debug, Serialize)]
pub struct SignUpMetadata<'a> {
    pub name: &'a str,
    pub dni: &'a str,
    pub phone: &'a str,
}

/// Response from the token and sign-up endpoints.
///
/// Sign-up returns a session when email confirmation is disabled and only the
/// user otherwise, so both shapes are accepted.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Option<UserMetadata>,
}

impl AuthResponse {
    /// The user in either response shape.
    #[must_use]
    pub fn into_user(self) -> Option<AuthUser> {
        self.user.or_else(|| {
            self.id.map(|id| AuthUser {
                id,
                email: self.email,
                user_metadata: self.user_metadata.unwrap_or_default(),
            })
        })
    }
}

/// A GoTrue user.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Metadata stored on the GoTrue user at sign-up.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dni: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Accept a string or a number, mapping anything else to `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
