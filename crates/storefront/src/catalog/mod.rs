//! Product catalog accessor.
//!
//! Read-only view of products, categories and store settings. The whole
//! product table is fetched once per cache lifetime; lookups, category
//! filters and search run over that cached list with the helpers in
//! [`ruway_core::catalog`].
//!
//! Backend failures never reach callers as errors. They are logged and the
//! result comes back empty with `unavailable` set, so pages still render.

mod cache;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use ruway_core::catalog::{find_by_id_or_sku, in_category, search};
use ruway_core::{Category, Product, StoreSettings};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::baas::conversions::{normalize_categories, normalize_products, normalize_settings};
use crate::baas::types::{CategoryRow, SettingsRow};
use crate::baas::{BaasError, SupabaseClient};

use cache::{CacheKey, CacheValue};

const PRODUCT_QUERY: &[(&str, &str)] = &[("select", "*,categories(slug)"), ("order", "name.asc")];
const CATEGORY_QUERY: &[(&str, &str)] = &[("select", "*"), ("order", "name.asc")];
const SETTINGS_QUERY: &[(&str, &str)] = &[("select", "*"), ("limit", "1")];

/// A list read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    /// The backend could not be reached; `items` is empty.
    pub unavailable: bool,
}

impl<T> Listing<T> {
    fn available(items: Vec<T>) -> Self {
        Self {
            items,
            unavailable: false,
        }
    }

    fn unavailable() -> Self {
        Self {
            items: Vec::new(),
            unavailable: true,
        }
    }
}

/// Result of a single-product lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    Missing,
    Unavailable,
}

// =============================================================================
// Catalog
// =============================================================================

/// Cached catalog accessor.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    client: SupabaseClient,
    cache: Cache<CacheKey, CacheValue>,
}

impl Catalog {
    /// Create a catalog that caches reads for `ttl`.
    #[must_use]
    pub fn new(client: SupabaseClient, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(16).time_to_live(ttl).build();

        Self {
            inner: Arc::new(CatalogInner { client, cache }),
        }
    }

    /// Every product, in catalog order.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Listing<Product> {
        match self.products().await {
            Ok(products) => Listing::available(products.to_vec()),
            Err(e) => unavailable("products", &e),
        }
    }

    /// Find a product by id, falling back to SKU.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn get_by_id(&self, key: &str) -> Lookup<Product> {
        match self.products().await {
            Ok(products) => find_by_id_or_sku(&products, key)
                .cloned()
                .map_or(Lookup::Missing, Lookup::Found),
            Err(e) => {
                tracing::warn!(error = %e, "Product lookup unavailable");
                Lookup::Unavailable
            }
        }
    }

    /// Products in the category with `slug`.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn list_by_category(&self, slug: &str) -> Listing<Product> {
        match self.products().await {
            Ok(products) => {
                Listing::available(in_category(&products, slug).into_iter().cloned().collect())
            }
            Err(e) => unavailable("products", &e),
        }
    }

    /// Case-insensitive substring search over name and description.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str) -> Listing<Product> {
        match self.products().await {
            Ok(products) => {
                Listing::available(search(&products, query).into_iter().cloned().collect())
            }
            Err(e) => unavailable("products", &e),
        }
    }

    /// Every category.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Listing<Category> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Listing::available(categories.to_vec());
        }

        match self
            .inner
            .client
            .select::<CategoryRow>("categories", CATEGORY_QUERY, None)
            .await
        {
            Ok(rows) => {
                let categories = Arc::new(normalize_categories(rows));
                self.inner
                    .cache
                    .insert(
                        CacheKey::Categories,
                        CacheValue::Categories(Arc::clone(&categories)),
                    )
                    .await;
                Listing::available(categories.to_vec())
            }
            Err(e) => unavailable("categories", &e),
        }
    }

    /// Store settings; defaults when the backend has none or is unreachable.
    #[instrument(skip(self))]
    pub async fn settings(&self) -> StoreSettings {
        if let Some(CacheValue::Settings(settings)) =
            self.inner.cache.get(&CacheKey::Settings).await
        {
            debug!("Cache hit for settings");
            return (*settings).clone();
        }

        match self
            .inner
            .client
            .select::<SettingsRow>("settings", SETTINGS_QUERY, None)
            .await
        {
            Ok(rows) => {
                let settings = Arc::new(normalize_settings(rows.into_iter().next()));
                self.inner
                    .cache
                    .insert(CacheKey::Settings, CacheValue::Settings(Arc::clone(&settings)))
                    .await;
                (*settings).clone()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Store settings unavailable, using defaults");
                StoreSettings::default()
            }
        }
    }

    /// Drop every cached read.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    /// The normalized product list, from cache when fresh.
    async fn products(&self) -> Result<Arc<Vec<Product>>, BaasError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let rows = self
            .inner
            .client
            .select::<serde_json::Value>("products", PRODUCT_QUERY, None)
            .await?;
        let products = Arc::new(normalize_products(rows));

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }
}

fn unavailable<T>(what: &str, error: &BaasError) -> Listing<T> {
    tracing::warn!(error = %error, what, "Catalog read failed, returning empty listing");
    Listing::unavailable()
}
