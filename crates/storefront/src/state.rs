//! Application state shared across handlers.

use std::sync::Arc;

use crate::baas::{BaasError, SupabaseClient};
use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::services::auth::AuthService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    auth: AuthService,
}

impl AppState {
    /// Create the application state, wiring one Supabase client into the
    /// catalog and the auth service.
    ///
    /// # Errors
    ///
    /// Returns an error if the Supabase endpoint URLs cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, BaasError> {
        let client = SupabaseClient::new(&config.supabase)?;
        let catalog = Catalog::new(client.clone(), config.catalog_cache_ttl);
        let auth = AuthService::new(client, config.admin_email.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                auth,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the cached catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }
}
