//! Checkout orchestration.
//!
//! A [`CheckoutSession`] walks a cart from "has items" to "order intent
//! recorded":
//!
//! ```text
//! CollectingInfo --submit(valid form, eligible method)--> AwaitingPaymentConfirmation
//! AwaitingPaymentConfirmation --back--> CollectingInfo
//! AwaitingPaymentConfirmation --confirm_payment--> Complete (cart cleared)
//! ```
//!
//! Only the manual QR method (Yape) reaches `AwaitingPaymentConfirmation`,
//! and only while the cart total is below [`MANUAL_QR_CEILING`]. Rejected
//! submissions never change the stage.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::cart::{CartEngine, CartItem, CartStorage};
use crate::types::{
    AccountProfile, Email, OrderStatus, PaymentStatus, Price, ProductId, UserId,
};

/// Cart totals at or above this ship for free.
pub const FREE_SHIPPING_THRESHOLD: Price = Price::new(Decimal::from_parts(200, 0, 0, false, 0));

/// Yape is only accepted for cart totals strictly below this.
pub const MANUAL_QR_CEILING: Price = Price::new(Decimal::from_parts(500, 0, 0, false, 0));

/// Minimum length of a national identity document number.
pub const MIN_DNI_LENGTH: usize = 8;

/// Minimum number of digits in a phone number.
pub const MIN_PHONE_DIGITS: usize = 9;

// =============================================================================
// Shipping & Payment Rules
// =============================================================================

/// Shipping decision for a cart total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shipping {
    Free,
    /// Cost is worked out with the customer after checkout.
    CalculatedAtNextStep,
}

impl Shipping {
    /// Decide shipping for `total`.
    #[must_use]
    pub fn for_total(total: Price) -> Self {
        if total >= FREE_SHIPPING_THRESHOLD {
            Self::Free
        } else {
            Self::CalculatedAtNextStep
        }
    }

    /// Whether shipping is free.
    #[must_use]
    pub const fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }

    /// Storefront label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::CalculatedAtNextStep => "Calculated at next step",
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Manual transfer by scanning the shop's Yape QR code.
    #[default]
    Yape,
    /// Credit/debit card. Listed but not accepted yet.
    Card,
}

impl PaymentMethod {
    /// Whether the method may be used for a cart totalling `total`.
    #[must_use]
    pub fn is_eligible(self, total: Price) -> bool {
        match self {
            Self::Yape => total < MANUAL_QR_CEILING,
            Self::Card => true,
        }
    }

    /// Whether the method can actually take payments today.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Yape)
    }

    /// Storefront label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yape => "Yape",
            Self::Card => "Credit/debit card",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Customer Form
// =============================================================================

/// Form field a validation message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerField {
    Dni,
    FullName,
    Phone,
    Email,
}

/// A message attached to one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: CustomerField,
    pub message: String,
}

/// All field errors for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Error)]
#[error("{} invalid field(s)", .0.len())]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    /// Whether `field` has an error.
    #[must_use]
    pub fn has(&self, field: CustomerField) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    fn push(&mut self, field: CustomerField, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }
}

/// Raw customer details as typed into the checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerForm {
    #[serde(default)]
    pub dni: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    /// Optional; blank means "no email".
    #[serde(default)]
    pub email: String,
}

impl CustomerForm {
    /// Initial form values: pre-filled for signed-in customers, blank for guests.
    #[must_use]
    pub fn prefill(profile: Option<&AccountProfile>) -> Self {
        profile.map_or_else(Self::default, |profile| Self {
            dni: profile.dni.clone().unwrap_or_default(),
            full_name: profile.name.clone(),
            phone: profile.phone.clone().unwrap_or_default(),
            email: profile
                .email
                .as_ref()
                .map(|email| email.as_str().to_owned())
                .unwrap_or_default(),
        })
    }

    /// Validate every field and collect all failures.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] listing each invalid field.
    pub fn validate(&self) -> Result<CustomerInfo, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let dni = self.dni.trim();
        if dni.is_empty() {
            errors.push(CustomerField::Dni, "DNI is required");
        } else if dni.chars().count() < MIN_DNI_LENGTH {
            errors.push(
                CustomerField::Dni,
                format!("DNI must be at least {MIN_DNI_LENGTH} characters"),
            );
        }

        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            errors.push(CustomerField::FullName, "Full name is required");
        }

        let phone = self.phone.trim();
        if phone.chars().filter(char::is_ascii_digit).count() < MIN_PHONE_DIGITS {
            errors.push(
                CustomerField::Phone,
                format!("Phone must have at least {MIN_PHONE_DIGITS} digits"),
            );
        }

        let email = match self.email.trim() {
            "" => None,
            raw => match Email::parse(raw) {
                Ok(email) => Some(email),
                Err(_) => {
                    errors.push(CustomerField::Email, "Invalid email address");
                    None
                }
            },
        };

        if !errors.0.is_empty() {
            return Err(errors);
        }

        Ok(CustomerInfo {
            dni: dni.to_owned(),
            full_name: full_name.to_owned(),
            phone: phone.to_owned(),
            email,
        })
    }
}

/// Validated customer details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub dni: String,
    pub full_name: String,
    pub phone: String,
    pub email: Option<Email>,
}

// =============================================================================
// Order Intent
// =============================================================================

/// One line of an order, frozen from a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub line_total: Price,
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product.id.clone(),
            name: item.product.name.clone(),
            sku: item.product.sku.clone(),
            unit_price: item.product.price,
            quantity: item.quantity,
            line_total: item.line_total(),
        }
    }
}

/// What the customer committed to buy.
///
/// `lines` equals the cart's items and `total` equals the cart's total at
/// the moment the order was confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub id: Uuid,
    pub user_id: Option<UserId>,
    pub customer: CustomerInfo,
    pub payment_method: PaymentMethod,
    pub lines: Vec<OrderLine>,
    pub total: Price,
    pub shipping: Shipping,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl OrderIntent {
    /// Snapshot `cart` into a pending order.
    #[must_use]
    pub fn from_cart<S: CartStorage>(
        cart: &CartEngine<S>,
        customer: CustomerInfo,
        payment_method: PaymentMethod,
        user_id: Option<UserId>,
    ) -> Self {
        let total = cart.total_price();
        Self {
            id: Uuid::new_v4(),
            user_id,
            customer,
            payment_method,
            lines: cart.items().iter().map(OrderLine::from).collect(),
            total,
            shipping: Shipping::for_total(total),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Checkout Session
// =============================================================================

/// Where a checkout currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStage {
    #[default]
    CollectingInfo,
    AwaitingPaymentConfirmation,
    Complete,
}

/// Errors returned by checkout transitions. None of them change state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// The customer form has invalid fields.
    #[error("customer details are invalid: {0}")]
    Validation(#[from] ValidationErrors),

    /// The payment method is not allowed for this cart total.
    #[error("{} is only available for purchases under {}", .method, MANUAL_QR_CEILING)]
    PaymentMethodIneligible { method: PaymentMethod, total: Price },

    /// Checkout needs at least one cart line.
    #[error("the cart is empty")]
    EmptyCart,

    /// The action is not valid in the current stage.
    #[error("cannot {action} while checkout is {stage:?}")]
    InvalidTransition {
        stage: CheckoutStage,
        action: &'static str,
    },
}

/// Result of a successful submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Show payment instructions for `amount`.
    AwaitingPayment { amount: Price },
    /// The method is listed but cannot take payments yet; stage unchanged.
    PaymentMethodUnavailable { method: PaymentMethod },
}

/// One customer's walk through checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckoutSession {
    stage: CheckoutStage,
    payment_method: PaymentMethod,
    customer: Option<CustomerInfo>,
    completed_order: Option<OrderIntent>,
}

impl CheckoutSession {
    /// Start a checkout in `CollectingInfo` with Yape selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn stage(&self) -> CheckoutStage {
        self.stage
    }

    #[must_use]
    pub const fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    #[must_use]
    pub const fn customer(&self) -> Option<&CustomerInfo> {
        self.customer.as_ref()
    }

    /// The order recorded when the session completed.
    #[must_use]
    pub const fn completed_order(&self) -> Option<&OrderIntent> {
        self.completed_order.as_ref()
    }

    /// Change the selected payment method.
    ///
    /// Selection is always allowed while collecting info; eligibility is
    /// enforced on submit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` outside `CollectingInfo`.
    pub fn select_payment_method(&mut self, method: PaymentMethod) -> Result<(), CheckoutError> {
        self.expect_stage(CheckoutStage::CollectingInfo, "change payment method")?;
        self.payment_method = method;
        Ok(())
    }

    /// Submit the customer form with a payment method.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` outside `CollectingInfo`
    /// - `EmptyCart` if the cart has no lines
    /// - `Validation` if any field is invalid
    /// - `PaymentMethodIneligible` if the method is not allowed for the total
    pub fn submit<S: CartStorage>(
        &mut self,
        form: &CustomerForm,
        method: PaymentMethod,
        cart: &CartEngine<S>,
    ) -> Result<SubmitOutcome, CheckoutError> {
        self.expect_stage(CheckoutStage::CollectingInfo, "submit")?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let customer = form.validate()?;
        let total = cart.total_price();
        if !method.is_eligible(total) {
            return Err(CheckoutError::PaymentMethodIneligible { method, total });
        }

        self.payment_method = method;
        self.customer = Some(customer);

        if !method.is_available() {
            return Ok(SubmitOutcome::PaymentMethodUnavailable { method });
        }

        self.stage = CheckoutStage::AwaitingPaymentConfirmation;
        Ok(SubmitOutcome::AwaitingPayment { amount: total })
    }

    /// Leave the payment instructions and go back to the form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` outside `AwaitingPaymentConfirmation`.
    pub fn back(&mut self) -> Result<(), CheckoutError> {
        self.expect_stage(CheckoutStage::AwaitingPaymentConfirmation, "go back")?;
        self.stage = CheckoutStage::CollectingInfo;
        Ok(())
    }

    /// The customer says they have paid: record the order and clear the cart.
    ///
    /// The cart is re-checked because it may have changed since submit; if the
    /// total is no longer eligible the session returns to `CollectingInfo`.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` outside `AwaitingPaymentConfirmation`
    /// - `EmptyCart` if the cart was emptied meanwhile
    /// - `PaymentMethodIneligible` if the total crossed the ceiling meanwhile
    pub fn confirm_payment<S: CartStorage>(
        &mut self,
        cart: &mut CartEngine<S>,
        user_id: Option<UserId>,
    ) -> Result<OrderIntent, CheckoutError> {
        self.expect_stage(CheckoutStage::AwaitingPaymentConfirmation, "confirm payment")?;
        if cart.is_empty() {
            self.stage = CheckoutStage::CollectingInfo;
            return Err(CheckoutError::EmptyCart);
        }

        let total = cart.total_price();
        if !self.payment_method.is_eligible(total) {
            self.stage = CheckoutStage::CollectingInfo;
            return Err(CheckoutError::PaymentMethodIneligible {
                method: self.payment_method,
                total,
            });
        }

        let Some(customer) = self.customer.clone() else {
            self.stage = CheckoutStage::CollectingInfo;
            return Err(CheckoutError::InvalidTransition {
                stage: CheckoutStage::CollectingInfo,
                action: "confirm payment without customer details",
            });
        };

        let order = OrderIntent::from_cart(cart, customer, self.payment_method, user_id);
        cart.clear();
        self.stage = CheckoutStage::Complete;
        self.completed_order = Some(order.clone());
        Ok(order)
    }

    fn expect_stage(
        &self,
        expected: CheckoutStage,
        action: &'static str,
    ) -> Result<(), CheckoutError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition {
                stage: self.stage,
                action,
            })
        }
    }
}

/// What to show when the customer navigates to checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutEntry {
    /// Nothing to buy and nothing completed: send them to the cart.
    RedirectToCart,
    /// Start collecting details, pre-filled from any earlier attempt.
    InProgress(CheckoutSession),
    /// Show the confirmation of a just-completed order.
    Completed(CheckoutSession),
}

/// Decide how checkout opens given the cart and any session in progress.
///
/// A completed session is only shown while the cart is still empty; adding
/// new items starts a fresh checkout. An unfinished session restarts at
/// `CollectingInfo`, keeping the customer details and payment method.
#[must_use]
pub fn enter<S: CartStorage>(
    cart: &CartEngine<S>,
    existing: Option<CheckoutSession>,
) -> CheckoutEntry {
    match existing {
        Some(session) if session.stage == CheckoutStage::Complete && cart.is_empty() => {
            CheckoutEntry::Completed(session)
        }
        Some(mut session) if session.stage != CheckoutStage::Complete && !cart.is_empty() => {
            session.stage = CheckoutStage::CollectingInfo;
            CheckoutEntry::InProgress(session)
        }
        _ if cart.is_empty() => CheckoutEntry::RedirectToCart,
        _ => CheckoutEntry::InProgress(CheckoutSession::new()),
    }
}
