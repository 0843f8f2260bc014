//! Cart route handlers.
//!
//! The cart lives in the session. Each handler loads it, applies one
//! mutation through the [`CartEngine`](ruway_core::cart::CartEngine) and
//! answers with the full cart view, including the notice the mutation
//! produced.

use axum::{Json, extract::State};
use ruway_core::cart::{CartDrawer, CartEngine, CartNotice, MemoryStorage};
use ruway_core::checkout::{FREE_SHIPPING_THRESHOLD, Shipping};
use ruway_core::{Price, Product, ProductId};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::catalog::Lookup;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::cart::{SessionCart, clear_checkout, load_drawer, save_drawer};
use crate::state::AppState;

/// One cart line as shown to the customer.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub product: Product,
    pub quantity: u32,
    pub line_total: Price,
}

/// A cart notice with its display message.
#[derive(Debug, Serialize)]
pub struct NoticeView {
    #[serde(flatten)]
    pub notice: CartNotice,
    pub message: String,
}

impl From<CartNotice> for NoticeView {
    fn from(notice: CartNotice) -> Self {
        let message = notice.message();
        Self { notice, message }
    }
}

/// Cart display data.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total_items: u64,
    pub total_price: Price,
    pub shipping: Shipping,
    pub shipping_label: &'static str,
    pub free_shipping_threshold: Price,
    pub drawer_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<NoticeView>,
}

impl CartView {
    /// Build the view from the current cart and drawer state.
    #[must_use]
    pub fn new(
        cart: &CartEngine<MemoryStorage>,
        drawer: CartDrawer,
        notice: Option<CartNotice>,
    ) -> Self {
        let total_price = cart.total_price();
        let shipping = Shipping::for_total(total_price);
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartLineView {
                    product: item.product.clone(),
                    quantity: item.quantity,
                    line_total: item.line_total(),
                })
                .collect(),
            total_items: cart.total_items(),
            total_price,
            shipping,
            shipping_label: shipping.label(),
            free_shipping_threshold: FREE_SHIPPING_THRESHOLD,
            drawer_open: drawer.is_open(),
            notice: notice.map(NoticeView::from),
        }
    }
}

/// Add to cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    /// Product id or SKU.
    pub product_id: String,
    pub quantity: Option<i64>,
}

/// Update quantity request.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// Remove from cart request.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: String,
}

/// Display the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = SessionCart::load(&session).await?;
    let drawer = load_drawer(&session).await?;
    Ok(Json(CartView::new(cart.cart(), drawer, None)))
}

/// Add a product to the cart and open the drawer.
///
/// The product is read from the catalog so the cart keeps the current price.
/// Out-of-stock products are refused.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let key = request.product_id.trim();
    if key.is_empty() {
        return Err(AppError::BadRequest("product_id is required".to_string()));
    }

    let product = match state.catalog().get_by_id(key).await {
        Lookup::Found(product) => product,
        Lookup::Missing => return Err(AppError::NotFound("Product".to_string())),
        Lookup::Unavailable => {
            return Err(AppError::Unavailable(
                "The catalog is temporarily unavailable".to_string(),
            ));
        }
    };

    if !product.stock_status.is_available() {
        return Err(AppError::Unprocessable(format!(
            "{} is out of stock",
            product.name
        )));
    }

    let product_id = product.id.clone();
    let mut cart = SessionCart::load(&session).await?;
    let notice = cart
        .cart_mut()
        .add_item(product, request.quantity.unwrap_or(1));
    cart.save().await?;

    let mut drawer = load_drawer(&session).await?;
    drawer.open();
    save_drawer(&session, drawer).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.as_str())]),
    );
    tracing::debug!(product_id = %product_id, total_items = cart.cart().total_items(), "Cart updated");

    Ok(Json(CartView::new(cart.cart(), drawer, notice)))
}

/// Set the quantity of a cart line. Zero or less removes it.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = SessionCart::load(&session).await?;
    let notice = cart
        .cart_mut()
        .update_item_quantity(&ProductId::new(request.product_id), request.quantity);
    cart.save().await?;

    let drawer = load_drawer(&session).await?;
    Ok(Json(CartView::new(cart.cart(), drawer, notice)))
}

/// Remove a cart line.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = SessionCart::load(&session).await?;
    let notice = cart
        .cart_mut()
        .remove_item(&ProductId::new(request.product_id));
    cart.save().await?;

    let drawer = load_drawer(&session).await?;
    Ok(Json(CartView::new(cart.cart(), drawer, Some(notice))))
}

/// Empty the cart and abandon any checkout in progress.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let mut cart = SessionCart::load(&session).await?;
    let notice = cart.cart_mut().clear();
    cart.save().await?;
    clear_checkout(&session).await?;

    let drawer = load_drawer(&session).await?;
    Ok(Json(CartView::new(cart.cart(), drawer, Some(notice))))
}

/// Toggle the cart drawer.
#[instrument(skip(session))]
pub async fn toggle(session: Session) -> Result<Json<CartView>> {
    set_drawer(&session, CartDrawer::toggle).await
}

/// Open the cart drawer.
#[instrument(skip(session))]
pub async fn open(session: Session) -> Result<Json<CartView>> {
    set_drawer(&session, CartDrawer::open).await
}

/// Close the cart drawer.
#[instrument(skip(session))]
pub async fn close(session: Session) -> Result<Json<CartView>> {
    set_drawer(&session, CartDrawer::close).await
}

async fn set_drawer(session: &Session, change: fn(&mut CartDrawer)) -> Result<Json<CartView>> {
    let mut drawer = load_drawer(session).await?;
    change(&mut drawer);
    save_drawer(session, drawer).await?;

    let cart = SessionCart::load(session).await?;
    Ok(Json(CartView::new(cart.cart(), drawer, None)))
}
