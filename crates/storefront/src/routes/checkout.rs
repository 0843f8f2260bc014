//! Checkout route handlers.
//!
//! The [`CheckoutSession`] state machine is kept in the visitor's session
//! next to the cart. Handlers load both, apply one transition and persist
//! the result; rejected transitions leave the stored state as it was.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use ruway_core::checkout::{
    CheckoutEntry, CheckoutSession, CheckoutStage, CustomerForm, CustomerInfo,
    FREE_SHIPPING_THRESHOLD, MANUAL_QR_CEILING, OrderIntent, PaymentMethod, Shipping,
    SubmitOutcome, enter,
};
use ruway_core::{AccountProfile, Price};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::routes::cart::CartLineView;
use crate::services::cart::{SessionCart, load_checkout, save_checkout};
use crate::state::AppState;

/// A payment method with its standing for the current total.
#[derive(Debug, Serialize)]
pub struct PaymentMethodOption {
    pub method: PaymentMethod,
    pub label: &'static str,
    pub eligible: bool,
    pub available: bool,
}

/// Checkout display data.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub stage: CheckoutStage,
    pub payment_method: PaymentMethod,
    pub payment_methods: Vec<PaymentMethodOption>,
    pub form: CustomerForm,
    pub items: Vec<CartLineView>,
    pub total_price: Price,
    pub shipping: Shipping,
    pub free_shipping_threshold: Price,
    pub manual_qr_ceiling: Price,
    /// Yape QR image, shown while awaiting payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yape_qr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderIntent>,
}

/// Submit response: the outcome plus the updated view.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    #[serde(flatten)]
    pub outcome: SubmitOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub checkout: CheckoutView,
}

/// Payment method selection request.
#[derive(Debug, Deserialize)]
pub struct PaymentMethodRequest {
    pub payment_method: PaymentMethod,
}

/// Customer details and the chosen payment method.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(flatten)]
    pub form: CustomerForm,
    /// Defaults to the method already selected.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

// =============================================================================
// View Helpers
// =============================================================================

fn form_from_customer(customer: &CustomerInfo) -> CustomerForm {
    CustomerForm {
        dni: customer.dni.clone(),
        full_name: customer.full_name.clone(),
        phone: customer.phone.clone(),
        email: customer
            .email
            .as_ref()
            .map(|email| email.as_str().to_owned())
            .unwrap_or_default(),
    }
}

async fn checkout_view(
    state: &AppState,
    checkout: &CheckoutSession,
    cart: &SessionCart,
    profile: Option<&AccountProfile>,
) -> CheckoutView {
    let order = checkout.completed_order().cloned();
    let (items, total_price) = match &order {
        // The cart is already empty; show what was bought.
        Some(order) => (Vec::new(), order.total),
        None => (
            cart.cart()
                .items()
                .iter()
                .map(|item| CartLineView {
                    product: item.product.clone(),
                    quantity: item.quantity,
                    line_total: item.line_total(),
                })
                .collect(),
            cart.cart().total_price(),
        ),
    };

    let form = checkout
        .customer()
        .map_or_else(|| CustomerForm::prefill(profile), form_from_customer);

    let yape_qr = if checkout.stage() == CheckoutStage::AwaitingPaymentConfirmation {
        state.catalog().settings().await.yape_qr
    } else {
        None
    };

    CheckoutView {
        stage: checkout.stage(),
        payment_method: checkout.payment_method(),
        payment_methods: [PaymentMethod::Yape, PaymentMethod::Card]
            .into_iter()
            .map(|method| PaymentMethodOption {
                method,
                label: method.label(),
                eligible: method.is_eligible(total_price),
                available: method.is_available(),
            })
            .collect(),
        form,
        items,
        total_price,
        shipping: Shipping::for_total(total_price),
        free_shipping_threshold: FREE_SHIPPING_THRESHOLD,
        manual_qr_ceiling: MANUAL_QR_CEILING,
        yape_qr,
        order,
    }
}

/// The checkout to act on: the stored one, or a fresh one when there is none
/// or the stored checkout is over and the cart has been refilled.
async fn current_checkout(session: &Session, cart: &SessionCart) -> CheckoutSession {
    match load_checkout(session).await {
        Some(checkout)
            if checkout.stage() == CheckoutStage::Complete && !cart.cart().is_empty() =>
        {
            CheckoutSession::new()
        }
        Some(checkout) => checkout,
        None => CheckoutSession::new(),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Open checkout.
///
/// Redirects to the cart when there is nothing to buy and no just-completed
/// order to show.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    let cart = SessionCart::load(&session).await?;

    let checkout = match enter(cart.cart(), load_checkout(&session).await) {
        CheckoutEntry::RedirectToCart => return Ok(Redirect::to("/cart").into_response()),
        CheckoutEntry::InProgress(checkout) => {
            save_checkout(&session, &checkout).await?;
            checkout
        }
        CheckoutEntry::Completed(checkout) => checkout,
    };

    let profile = user.as_ref().map(|u| &u.profile);
    Ok(Json(checkout_view(&state, &checkout, &cart, profile).await).into_response())
}

/// Change the selected payment method.
#[instrument(skip(state, session, user))]
pub async fn select_payment_method(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<PaymentMethodRequest>,
) -> Result<Json<CheckoutView>> {
    let cart = SessionCart::load(&session).await?;
    let mut checkout = current_checkout(&session, &cart).await;

    checkout.select_payment_method(request.payment_method)?;
    save_checkout(&session, &checkout).await?;

    let profile = user.as_ref().map(|u| &u.profile);
    Ok(Json(checkout_view(&state, &checkout, &cart, profile).await))
}

/// Submit customer details.
///
/// Invalid fields and an ineligible payment method are answered with 422
/// and leave the checkout where it was.
#[instrument(skip(state, session, user, request), fields(payment_method = ?request.payment_method))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>> {
    let cart = SessionCart::load(&session).await?;
    let mut checkout = current_checkout(&session, &cart).await;
    let method = request
        .payment_method
        .unwrap_or_else(|| checkout.payment_method());

    let outcome = checkout.submit(&request.form, method, cart.cart())?;
    save_checkout(&session, &checkout).await?;

    let message = match &outcome {
        SubmitOutcome::AwaitingPayment { amount } => {
            let amount = amount.to_string();
            add_breadcrumb("checkout", "Awaiting payment", Some(&[("amount", amount.as_str())]));
            None
        }
        SubmitOutcome::PaymentMethodUnavailable { method } => {
            Some(format!("{method} payments are not available yet"))
        }
    };

    let profile = user.as_ref().map(|u| &u.profile);
    Ok(Json(SubmitResponse {
        outcome,
        message,
        checkout: checkout_view(&state, &checkout, &cart, profile).await,
    }))
}

/// Leave the payment instructions and return to the form.
#[instrument(skip(state, session, user))]
pub async fn back(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<CheckoutView>> {
    let cart = SessionCart::load(&session).await?;
    let mut checkout = current_checkout(&session, &cart).await;

    checkout.back()?;
    save_checkout(&session, &checkout).await?;

    let profile = user.as_ref().map(|u| &u.profile);
    Ok(Json(checkout_view(&state, &checkout, &cart, profile).await))
}

/// The customer confirms the Yape transfer.
///
/// Records the order, empties the cart and completes checkout. If the cart
/// changed so that it is empty or above the Yape ceiling, checkout falls
/// back to the form and the request is rejected.
#[instrument(skip(state, session, user))]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<CheckoutView>> {
    let mut cart = SessionCart::load(&session).await?;
    let mut checkout = current_checkout(&session, &cart).await;
    let stage_before = checkout.stage();

    let user_id = user.as_ref().map(|u| u.profile.id.clone());
    let result = checkout.confirm_payment(cart.cart_mut(), user_id);

    // A failed confirmation may still have moved the checkout back to the form.
    if checkout.stage() != stage_before {
        save_checkout(&session, &checkout).await?;
    }
    let order = result?;
    cart.save().await?;

    tracing::info!(
        order_id = %order.id,
        total = %order.total,
        lines = order.lines.len(),
        payment_method = %order.payment_method,
        signed_in = order.user_id.is_some(),
        "Order placed"
    );
    let order_id = order.id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));

    let profile = user.as_ref().map(|u| &u.profile);
    Ok(Json(checkout_view(&state, &checkout, &cart, profile).await))
}
