//! Signed-in account facts consumed by checkout.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;

/// Profile of an authenticated customer.
///
/// Only the identity provider creates these; checkout reads them to pre-fill
/// the customer form and to attach the user id to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: UserId,
    pub email: Option<Email>,
    pub name: String,
    /// National identity document number.
    pub dni: Option<String>,
    pub phone: Option<String>,
    pub is_admin: bool,
}
