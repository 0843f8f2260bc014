//! Session-backed cart and checkout state.
//!
//! Each request copies the session's cart snapshot into a [`MemoryStorage`],
//! lets the [`CartEngine`] work on it, and writes the snapshot back only if a
//! mutation changed it. Concurrent requests from the same session resolve as
//! last write wins.

use ruway_core::cart::{CartDrawer, CartEngine, MemoryStorage};
use ruway_core::checkout::CheckoutSession;
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

use crate::models::session_keys;

/// A cart loaded from the session.
pub struct SessionCart {
    session: Session,
    cart: CartEngine<MemoryStorage>,
    loaded_snapshot: Option<String>,
}

impl SessionCart {
    /// Load the cart stored in `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(session: &Session) -> Result<Self, SessionError> {
        let loaded_snapshot: Option<String> = session.get(session_keys::CART).await?;
        let storage = loaded_snapshot
            .clone()
            .map_or_else(MemoryStorage::new, MemoryStorage::with_cart_snapshot);

        Ok(Self {
            session: session.clone(),
            cart: CartEngine::restore(storage),
            loaded_snapshot,
        })
    }

    #[must_use]
    pub const fn cart(&self) -> &CartEngine<MemoryStorage> {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartEngine<MemoryStorage> {
        &mut self.cart
    }

    /// Write the snapshot back if it changed since loading.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn save(&mut self) -> Result<(), SessionError> {
        let snapshot = self.cart.storage().cart_snapshot();
        if snapshot == self.loaded_snapshot.as_deref() {
            return Ok(());
        }

        if let Some(snapshot) = snapshot {
            self.session.insert(session_keys::CART, snapshot).await?;
            self.loaded_snapshot = Some(snapshot.to_owned());
        }
        Ok(())
    }
}

/// Read the drawer state; closed when unset.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_drawer(session: &Session) -> Result<CartDrawer, SessionError> {
    Ok(session
        .get::<CartDrawer>(session_keys::CART_OPEN)
        .await?
        .unwrap_or_default())
}

/// Persist the drawer state.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn save_drawer(session: &Session, drawer: CartDrawer) -> Result<(), SessionError> {
    session.insert(session_keys::CART_OPEN, drawer).await
}

/// Read the checkout in progress, if any.
///
/// A value that no longer decodes is treated as absent.
pub async fn load_checkout(session: &Session) -> Option<CheckoutSession> {
    session
        .get::<CheckoutSession>(session_keys::CHECKOUT)
        .await
        .ok()
        .flatten()
}

/// Persist the checkout in progress.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn save_checkout(session: &Session, checkout: &CheckoutSession) -> Result<(), SessionError> {
    session.insert(session_keys::CHECKOUT, checkout).await
}

/// Forget the checkout in progress.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn clear_checkout(session: &Session) -> Result<(), SessionError> {
    session
        .remove::<CheckoutSession>(session_keys::CHECKOUT)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use ruway_core::{PLACEHOLDER_IMAGE, Price, Product, ProductId, StockStatus};
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn product(id: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Price::from_cents(1000),
            original_price: None,
            image: PLACEHOLDER_IMAGE.to_string(),
            images: None,
            category: "componentes".to_string(),
            sku: format!("SKU-{id}"),
            stock_status: StockStatus::InStock,
            specs: None,
            features: None,
        }
    }

    #[tokio::test]
    async fn test_cart_survives_reload_through_session() {
        let session = session();

        let mut cart = SessionCart::load(&session).await.unwrap();
        assert!(cart.cart().is_empty());
        cart.cart_mut().add_item(product("P1"), 2);
        cart.save().await.unwrap();

        let reloaded = SessionCart::load(&session).await.unwrap();
        assert_eq!(reloaded.cart().total_items(), 2);
        assert_eq!(reloaded.cart().total_price(), Price::from_cents(2000));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_loads_empty() {
        let session = session();
        session
            .insert(session_keys::CART, "{not json")
            .await
            .unwrap();

        let cart = SessionCart::load(&session).await.unwrap();
        assert!(cart.cart().is_empty());
    }

    #[tokio::test]
    async fn test_drawer_defaults_closed() {
        let session = session();
        assert!(!load_drawer(&session).await.unwrap().is_open());

        let mut drawer = CartDrawer::default();
        drawer.toggle();
        save_drawer(&session, drawer).await.unwrap();
        assert!(load_drawer(&session).await.unwrap().is_open());
    }

    #[tokio::test]
    async fn test_checkout_round_trip_and_clear() {
        let session = session();
        assert!(load_checkout(&session).await.is_none());

        save_checkout(&session, &CheckoutSession::new()).await.unwrap();
        assert_eq!(load_checkout(&session).await, Some(CheckoutSession::new()));

        clear_checkout(&session).await.unwrap();
        assert!(load_checkout(&session).await.is_none());
    }
}
