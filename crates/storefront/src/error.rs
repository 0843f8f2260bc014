//! Unified error handling with Sentry integration.
//!
//! Every handler returns [`Result`]. Server-side failures are captured to
//! Sentry before responding; client errors are answered with a JSON body
//! `{"error": "...", "fields": [...]}` where `fields` is only present for
//! form validation failures.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ruway_core::checkout::{CheckoutError, FieldError};
use serde::Serialize;
use thiserror::Error;

use crate::baas::BaasError;
use crate::services::auth::AuthError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Supabase request failed.
    #[error("Backend error: {0}")]
    Baas(#[from] BaasError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout transition rejected.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request needs a signed-in user.
    #[error("Unauthorized")]
    Unauthorized,

    /// The signed-in user may not do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Request understood but refused for this resource's current state.
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    /// The catalog could not be read.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [FieldError]>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Baas(_) => StatusCode::BAD_GATEWAY,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Checkout(err) => match err {
                CheckoutError::Validation(_) | CheckoutError::PaymentMethodIneligible { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                CheckoutError::EmptyCart | CheckoutError::InvalidTransition { .. } => {
                    StatusCode::CONFLICT
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists | AuthError::EmailUnavailable => StatusCode::CONFLICT,
                AuthError::Validation(_)
                | AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AuthError::IncompleteResponse(_) | AuthError::Baas(_) => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message. Internal details never leave the server.
    fn public_message(&self) -> String {
        match self {
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Baas(_) => "External service error".to_string(),
            Self::Checkout(err) => match err {
                CheckoutError::Validation(_) => "Please correct the highlighted fields".to_string(),
                CheckoutError::EmptyCart => "Your cart is empty".to_string(),
                CheckoutError::InvalidTransition { .. } => {
                    "Checkout step is no longer valid, please reload".to_string()
                }
                CheckoutError::PaymentMethodIneligible { .. } => err.to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid email or password".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::EmailUnavailable => {
                    "This email cannot be used for registration".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::Validation(_) => "Please correct the highlighted fields".to_string(),
                AuthError::IncompleteResponse(_) | AuthError::Baas(_) => {
                    "Authentication service error".to_string()
                }
            },
            Self::NotFound(what) => format!("{what} not found"),
            Self::Unauthorized => "Please sign in".to_string(),
            Self::Unprocessable(msg)
            | Self::Forbidden(msg)
            | Self::Unavailable(msg)
            | Self::BadRequest(msg) => {
                msg.clone()
            }
        }
    }

    fn fields(&self) -> Option<&[FieldError]> {
        match self {
            Self::Checkout(CheckoutError::Validation(errors))
            | Self::Auth(AuthError::Validation(errors)) => Some(&errors.0),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorBody {
            error: self.public_message(),
            fields: self.fields(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "001011")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;
    use ruway_core::Price;
    use ruway_core::checkout::{CheckoutStage, CustomerForm, PaymentMethod};

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Product".to_string());
        assert_eq!(err.to_string(), "Not found: Product");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("test".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::UserAlreadyExists).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Checkout(CheckoutError::EmptyCart).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Checkout(CheckoutError::InvalidTransition {
                stage: CheckoutStage::Complete,
                action: "submit",
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Baas(BaasError::RateLimited(5)).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden("admins only".to_string()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Internal("test".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let errors = CustomerForm::default().validate().unwrap_err();
        let (status, body) = body_json(AppError::Checkout(errors.into())).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields = body["fields"].as_array().unwrap();
        assert!(fields.iter().any(|f| f["field"] == "dni"));
        assert!(fields.iter().any(|f| f["field"] == "full_name"));
    }

    #[tokio::test]
    async fn test_ineligible_payment_message() {
        let err = CheckoutError::PaymentMethodIneligible {
            method: PaymentMethod::Yape,
            total: Price::from_cents(60_000),
        };
        let (status, body) = body_json(err.into()).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["error"],
            "Yape is only available for purchases under S/ 500.00"
        );
        assert!(body.get("fields").is_none());
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let (status, body) = body_json(AppError::Internal("db password wrong".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }
}
