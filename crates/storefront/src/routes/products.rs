//! Catalog route handlers.
//!
//! Catalog reads never fail the request: when the backend is unreachable the
//! listing comes back empty with `unavailable: true` so the client can show
//! a notice instead of an error page.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use ruway_core::{Category, Product, StoreSettings};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::catalog::{Listing, Lookup};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Category slug.
    pub category: Option<String>,
    /// Search text matched against name and description.
    pub q: Option<String>,
}

/// Product detail response.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub product: Option<Product>,
    pub unavailable: bool,
}

/// List products, optionally searched and filtered by category.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Json<Listing<Product>> {
    let category = query.category.filter(|slug| !slug.trim().is_empty());
    let search = query.q.filter(|q| !q.trim().is_empty());

    let listing = match (search, category) {
        (Some(q), category) => {
            let mut listing = state.catalog().search(&q).await;
            if let Some(slug) = category {
                listing.items.retain(|product| product.category == slug);
            }
            listing
        }
        (None, Some(slug)) => state.catalog().list_by_category(&slug).await,
        (None, None) => state.catalog().list().await,
    };

    Json(listing)
}

/// Show one product by id or SKU.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetail>> {
    match state.catalog().get_by_id(&id).await {
        Lookup::Found(product) => Ok(Json(ProductDetail {
            product: Some(product),
            unavailable: false,
        })),
        Lookup::Unavailable => Ok(Json(ProductDetail {
            product: None,
            unavailable: true,
        })),
        Lookup::Missing => Err(AppError::NotFound("Product".to_string())),
    }
}

/// List categories.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Json<Listing<Category>> {
    Json(state.catalog().categories().await)
}

/// Store settings (company details, Yape QR).
#[instrument(skip(state))]
pub async fn settings(State(state): State<AppState>) -> Json<StoreSettings> {
    Json(state.catalog().settings().await)
}

/// Drop cached catalog reads so the next request sees fresh backend data.
///
/// Administrator only.
#[instrument(skip(state, user))]
pub async fn refresh(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<StatusCode> {
    let user = user.ok_or(AppError::Unauthorized)?;
    if !user.profile.is_admin {
        return Err(AppError::Forbidden(
            "Only the administrator can refresh the catalog".to_string(),
        ));
    }

    state.catalog().invalidate_all().await;
    tracing::info!(user_id = %user.profile.id, "Catalog cache refreshed");
    add_breadcrumb("catalog", "Cache refreshed", None);

    Ok(StatusCode::NO_CONTENT)
}
