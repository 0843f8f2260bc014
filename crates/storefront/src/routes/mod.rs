//! HTTP route handlers for the storefront.
//!
//! Every endpoint speaks JSON. Cart, drawer and checkout state live in the
//! visitor's session, so guests can shop and check out without an account.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Catalog
//! GET  /products               - Product listing (?category=slug, ?q=query)
//! GET  /products/{id}          - Product detail (id or SKU)
//! GET  /categories             - Category listing
//! GET  /settings               - Store settings
//! POST /catalog/refresh        - Drop cached catalog reads (admin)
//!
//! # Cart
//! GET  /cart                   - Cart view
//! POST /cart/add               - Add product (opens the drawer)
//! POST /cart/update            - Set line quantity (<= 0 removes)
//! POST /cart/remove            - Remove line
//! POST /cart/clear             - Empty the cart
//! POST /cart/toggle            - Toggle drawer
//! POST /cart/open              - Open drawer
//! POST /cart/close             - Close drawer
//!
//! # Checkout
//! GET  /checkout               - Checkout view (303 to /cart when empty)
//! POST /checkout/payment-method - Select payment method
//! POST /checkout/submit        - Submit customer details
//! POST /checkout/back          - Back to the form
//! POST /checkout/confirm       - "I have paid"
//!
//! # Auth (rate limited)
//! POST /auth/login             - Sign in
//! POST /auth/register          - Register
//! POST /auth/logout            - Sign out
//! GET  /auth/me                - Current user
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/categories", get(products::categories))
        .route("/settings", get(products::settings))
        .route("/catalog/refresh", post(products::refresh))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/toggle", post(cart::toggle))
        .route("/open", post(cart::open))
        .route("/close", post(cart::close))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/payment-method", post(checkout::select_payment_method))
        .route("/submit", post(checkout::submit))
        .route("/back", post(checkout::back))
        .route("/confirm", post(checkout::confirm))
}

/// Create the auth routes router.
///
/// Sign-in and registration are rate limited per client IP.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .layer(auth_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/auth", auth_routes())
}
