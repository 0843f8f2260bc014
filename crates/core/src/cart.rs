//! Cart engine.
//!
//! [`CartEngine`] is the only thing allowed to mutate a customer's list of
//! pending purchases. It keeps two invariants at all times:
//!
//! - at most one [`CartItem`] per product id
//! - every line has `quantity >= 1`
//!
//! Totals are never stored; [`CartEngine::total_items`] and
//! [`CartEngine::total_price`] fold over the current lines on every call.
//!
//! Every mutation writes the full line list through a [`CartStorage`] under
//! [`CART_STORAGE_KEY`]. The stored value is only read once, in
//! [`CartEngine::restore`]; anything that does not decode into a valid cart
//! is discarded and the customer starts with an empty cart.
//!
//! Visibility of the cart drawer is presentation state and lives in
//! [`CartDrawer`], not in the engine.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{Price, Product, ProductId};

/// Storage key the serialized cart is written under.
pub const CART_STORAGE_KEY: &str = "ruway_cart";

/// One product in the cart with its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Snapshot of the product at the time it was added.
    pub product: Product,
    /// Always at least 1 while the item is in a cart.
    pub quantity: u32,
}

impl CartItem {
    /// `price * quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// Key-value storage for serialized cart snapshots.
///
/// Implementations decide where the snapshot lives (process memory, a user
/// session, ...). Writes are whole-value replacements.
pub trait CartStorage {
    /// Read the raw value stored under `key`, if any.
    fn load(&self, key: &str) -> Option<String>;

    /// Replace the value stored under `key`.
    fn store(&mut self, key: &str, value: String);
}

/// In-memory [`CartStorage`].
///
/// Also used by the storefront as a staging buffer: the session value is
/// copied in before a request mutates the cart and copied back out after.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-seeded with a raw cart snapshot.
    #[must_use]
    pub fn with_cart_snapshot(snapshot: impl Into<String>) -> Self {
        let mut storage = Self::new();
        storage.store(CART_STORAGE_KEY, snapshot.into());
        storage
    }

    /// The raw cart snapshot, if one has been written.
    #[must_use]
    pub fn cart_snapshot(&self) -> Option<&str> {
        self.entries.get(CART_STORAGE_KEY).map(String::as_str)
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn store(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_owned(), value);
    }
}

/// Informational notice produced by a cart mutation.
///
/// The engine never displays anything; callers decide how to show these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartNotice {
    /// A product was added (or its quantity increased).
    Added {
        product_name: String,
        quantity: u32,
    },
    /// A product was removed.
    Removed,
    /// The cart was emptied.
    Cleared,
}

impl CartNotice {
    /// Human-readable message for toasts and flash messages.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Added { product_name, .. } => format!("{product_name} added to cart"),
            Self::Removed => "Product removed from cart".to_string(),
            Self::Cleared => "Cart emptied".to_string(),
        }
    }
}

/// The cart and its persistence.
#[derive(Debug, Clone)]
pub struct CartEngine<S> {
    items: Vec<CartItem>,
    storage: S,
}

impl<S: CartStorage> CartEngine<S> {
    /// Build the engine from whatever `storage` holds.
    ///
    /// A missing, unparsable or invariant-violating snapshot yields an empty
    /// cart. The storage is not rewritten until the first mutation.
    pub fn restore(storage: S) -> Self {
        let items = storage
            .load(CART_STORAGE_KEY)
            .and_then(|raw| decode_snapshot(&raw))
            .unwrap_or_default();

        Self { items, storage }
    }

    /// Current lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The line for `product_id`, if present.
    #[must_use]
    pub fn item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product.id == product_id)
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of `price * quantity` across all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Borrow the backing storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Consume the engine and return its storage.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Add `quantity` units of `product`.
    ///
    /// Increments the existing line for the product or appends a new one.
    /// A non-positive `quantity` is not rejected: the resulting quantity goes
    /// through [`Self::update_item_quantity`], so it can remove the line.
    ///
    /// The notice describes what actually changed: `Added` only for a
    /// positive `quantity`, `Removed` only when a line was dropped, and none
    /// when the cart is unchanged or a line merely shrank.
    pub fn add_item(&mut self, product: Product, quantity: i64) -> Option<CartNotice> {
        let product_id = product.id.clone();
        let product_name = product.name.clone();

        if let Some(item) = self.item(&product_id) {
            let next = i64::from(item.quantity).saturating_add(quantity);
            if let Some(removed) = self.update_item_quantity(&product_id, next) {
                return Some(removed);
            }
        } else if quantity > 0 {
            self.items.push(CartItem {
                product,
                quantity: clamp_quantity(quantity),
            });
            self.persist();
        }

        (quantity > 0).then(|| CartNotice::Added {
            product_name,
            quantity: clamp_quantity(quantity),
        })
    }

    /// Remove the line for `product_id`. Absent ids are a no-op.
    pub fn remove_item(&mut self, product_id: &ProductId) -> CartNotice {
        self.items.retain(|item| &item.product.id != product_id);
        self.persist();
        CartNotice::Removed
    }

    /// Set the quantity of the line for `product_id`.
    ///
    /// `quantity <= 0` removes the line (returning the removal notice).
    /// Otherwise the quantity is replaced, not incremented. Absent ids are a
    /// no-op.
    pub fn update_item_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Option<CartNotice> {
        if quantity <= 0 {
            return Some(self.remove_item(product_id));
        }

        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| &item.product.id == product_id)
        {
            item.quantity = clamp_quantity(quantity);
            self.persist();
        }

        None
    }

    /// Remove every line.
    pub fn clear(&mut self) -> CartNotice {
        self.items.clear();
        self.persist();
        CartNotice::Cleared
    }

    fn persist(&mut self) {
        // Serializing owned strings and decimals cannot fail.
        if let Ok(snapshot) = serde_json::to_string(&self.items) {
            self.storage.store(CART_STORAGE_KEY, snapshot);
        }
    }
}

impl CartEngine<MemoryStorage> {
    /// An empty cart backed by fresh in-memory storage.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::restore(MemoryStorage::new())
    }
}

/// Decode a stored snapshot, rejecting anything that breaks the invariants.
fn decode_snapshot(raw: &str) -> Option<Vec<CartItem>> {
    let items: Vec<CartItem> = serde_json::from_str(raw).ok()?;

    let mut seen = HashSet::with_capacity(items.len());
    let valid = items
        .iter()
        .all(|item| item.quantity >= 1 && seen.insert(item.product.id.clone()));

    valid.then_some(items)
}

fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.max(1)).unwrap_or(u32::MAX)
}

/// Open/closed state of the cart drawer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartDrawer {
    open: bool,
}

impl CartDrawer {
    /// Whether the drawer is visible.
    #[must_use]
    pub const fn is_open(self) -> bool {
        self.open
    }

    /// Show the drawer.
    pub const fn open(&mut self) {
        self.open = true;
    }

    /// Hide the drawer.
    pub const fn close(&mut self) {
        self.open = false;
    }

    /// Flip visibility.
    pub const fn toggle(&mut self) {
        self.open = !self.open;
    }
}
