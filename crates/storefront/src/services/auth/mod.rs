//! Authentication service.
//!
//! Email/password accounts are held by GoTrue. This service signs customers
//! in and up, loads their profile row, and decides who is the administrator
//! (exactly one configured email).

mod error;

pub use error::AuthError;

use ruway_core::checkout::CustomerForm;
use ruway_core::{AccountProfile, Email, EmailError, UserId};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use crate::baas::types::{
    AuthResponse, AuthUser, PasswordGrant, ProfileRow, SignUpMetadata, SignUpRequest,
};
use crate::baas::{BaasError, SupabaseClient};
use crate::models::CurrentUser;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Display name for the administrator when their profile has none.
const ADMIN_DISPLAY_NAME: &str = "Administrador";

/// Registration form data.
#[derive(Deserialize)]
pub struct RegistrationForm {
    pub name: String,
    pub dni: String,
    pub phone: String,
    /// Optional; a placeholder derived from the DNI is used when absent.
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("name", &self.name)
            .field("dni", &self.dni)
            .field("phone", &self.phone)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Result of a successful sign-up.
#[derive(Debug)]
pub enum SignUpOutcome {
    /// The backend issued a session right away.
    SignedIn(CurrentUser),
    /// The account exists but the email must be confirmed before signing in.
    ConfirmationRequired { email: Email },
}

/// Placeholder email for customers who register without one.
///
/// # Errors
///
/// Returns `EmailError` if the DNI produces an invalid address.
pub fn placeholder_email(dni: &str) -> Result<Email, EmailError> {
    Email::parse(&format!("user_{}@placeholder.com", dni.trim()))
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    client: SupabaseClient,
    admin_email: Email,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(client: SupabaseClient, admin_email: Email) -> Self {
        Self {
            client,
            admin_email,
        }
    }

    /// Whether `email` belongs to the administrator.
    #[must_use]
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_email.eq_ignore_case(email)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidCredentials` if the backend rejects the
    /// credentials.
    #[instrument(skip(self, email, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email.trim())?;

        let response: AuthResponse = self
            .client
            .auth_post(
                "token",
                &[("grant_type", "password")],
                &PasswordGrant {
                    email: email.as_str(),
                    password,
                },
            )
            .await
            .map_err(|e| match e.status() {
                Some(400 | 401) => AuthError::InvalidCredentials,
                _ => AuthError::Baas(e),
            })?;

        let access_token = response
            .access_token
            .clone()
            .ok_or(AuthError::IncompleteResponse("access_token"))?;
        let user = response
            .into_user()
            .ok_or(AuthError::IncompleteResponse("user"))?;

        let profile = self.load_profile(user, &access_token).await;
        tracing::info!(user_id = %profile.id, is_admin = profile.is_admin, "Customer signed in");

        Ok(CurrentUser::new(profile, access_token))
    }

    /// Register a new customer.
    ///
    /// Name, DNI and phone follow the checkout form rules; the email is
    /// optional and falls back to [`placeholder_email`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` or `AuthError::WeakPassword` for bad
    /// input, `AuthError::EmailUnavailable` for the administrator's email and
    /// `AuthError::UserAlreadyExists` if the email is taken.
    #[instrument(skip(self, form))]
    pub async fn sign_up(&self, form: &RegistrationForm) -> Result<SignUpOutcome, AuthError> {
        let customer = CustomerForm {
            dni: form.dni.clone(),
            full_name: form.name.clone(),
            phone: form.phone.clone(),
            email: form.email.clone().unwrap_or_default(),
        }
        .validate()?;
        validate_password(&form.password)?;

        let email = match customer.email.clone() {
            Some(email) => email,
            None => placeholder_email(&customer.dni)?,
        };

        if self.is_admin_email(email.as_str()) {
            return Err(AuthError::EmailUnavailable);
        }

        let request = SignUpRequest {
            email: email.as_str(),
            password: &form.password,
            data: SignUpMetadata {
                name: &customer.full_name,
                dni: &customer.dni,
                phone: &customer.phone,
            },
        };

        let response: AuthResponse = self
            .client
            .auth_post("signup", &[], &request)
            .await
            .map_err(|e| match &e {
                BaasError::Status { status, message }
                    if matches!(*status, 400 | 422)
                        && message.to_lowercase().contains("already registered") =>
                {
                    AuthError::UserAlreadyExists
                }
                _ => AuthError::Baas(e),
            })?;

        let access_token = response.access_token.clone();
        let user = response
            .into_user()
            .ok_or(AuthError::IncompleteResponse("user"))?;

        tracing::info!(user_id = %user.id, "Customer registered");

        let Some(access_token) = access_token else {
            return Ok(SignUpOutcome::ConfirmationRequired { email });
        };

        let profile = AccountProfile {
            id: UserId::new(user.id),
            email: Some(email),
            name: customer.full_name,
            dni: Some(customer.dni),
            phone: Some(customer.phone),
            is_admin: false,
        };

        Ok(SignUpOutcome::SignedIn(CurrentUser::new(profile, access_token)))
    }

    /// Revoke the session on the backend.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Baas` if the request fails. An already expired
    /// token counts as signed out.
    #[instrument(skip(self, user), fields(user_id = %user.profile.id))]
    pub async fn sign_out(&self, user: &CurrentUser) -> Result<(), AuthError> {
        match self
            .client
            .auth_post_empty("logout", &user.access_token())
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if matches!(e.status(), Some(401 | 403 | 404)) => {
                tracing::debug!(error = %e, "Session already gone on sign out");
                Ok(())
            }
            Err(e) => Err(AuthError::Baas(e)),
        }
    }

    /// Build the account profile from the `profiles` row, falling back to the
    /// metadata stored on the auth user.
    async fn load_profile(&self, user: AuthUser, access_token: &str) -> AccountProfile {
        let filter = format!("eq.{}", user.id);
        let token = SecretString::from(access_token.to_owned());
        let row = match self
            .client
            .select::<ProfileRow>(
                "profiles",
                &[("select", "name,dni,phone"), ("id", filter.as_str())],
                Some(&token),
            )
            .await
        {
            Ok(rows) => rows.into_iter().next().unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user.id, "Profile lookup failed, using user metadata");
                ProfileRow::default()
            }
        };

        let email = user.email.as_deref().and_then(|raw| Email::parse(raw).ok());
        let is_admin = email
            .as_ref()
            .is_some_and(|email| self.is_admin_email(email.as_str()));

        let metadata = user.user_metadata;
        let mut name = non_blank(row.name)
            .or_else(|| non_blank(metadata.name))
            .unwrap_or_default();
        if is_admin && name.is_empty() {
            name = ADMIN_DISPLAY_NAME.to_string();
        }

        AccountProfile {
            id: UserId::new(user.id),
            email,
            name,
            dni: non_blank(row.dni).or_else(|| non_blank(metadata.dni)),
            phone: non_blank(row.phone).or_else(|| non_blank(metadata.phone)),
            is_admin,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_email() {
        assert_eq!(
            placeholder_email("72345678").unwrap().as_str(),
            "user_72345678@placeholder.com"
        );
        assert!(placeholder_email("723 45678").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(matches!(
            validate_password("12345"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn test_registration_form_debug_redacts_password() {
        let form = RegistrationForm {
            name: "Ana".to_string(),
            dni: "72345678".to_string(),
            phone: "987654321".to_string(),
            email: None,
            password: "hunter22".to_string(),
        };
        let debug_output = format!("{form:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter22"));
    }
}
