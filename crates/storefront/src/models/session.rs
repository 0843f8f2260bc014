//! Session-related types.
//!
//! Types stored in the session for authentication state.

use ruway_core::AccountProfile;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Session-stored user identity.
///
/// Holds the profile used to pre-fill checkout and the backend access token
/// used for calls made on the user's behalf.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub profile: AccountProfile,
    access_token: String,
}

impl CurrentUser {
    /// Create a session identity.
    #[must_use]
    pub fn new(profile: AccountProfile, access_token: impl Into<String>) -> Self {
        Self {
            profile,
            access_token: access_token.into(),
        }
    }

    /// The backend access token.
    #[must_use]
    pub fn access_token(&self) -> SecretString {
        SecretString::from(self.access_token.clone())
    }
}

impl std::fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentUser")
            .field("profile", &self.profile)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the serialized cart snapshot.
    pub const CART: &str = ruway_core::cart::CART_STORAGE_KEY;

    /// Key for the cart drawer visibility flag.
    pub const CART_OPEN: &str = "cart_open";

    /// Key for the in-progress checkout.
    pub const CHECKOUT: &str = "checkout";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ruway_core::UserId;

    use super::*;

    #[test]
    fn test_current_user_debug_redacts_token() {
        let user = CurrentUser::new(
            AccountProfile {
                id: UserId::new("u-1"),
                email: None,
                name: "Ana".to_string(),
                dni: None,
                phone: None,
                is_admin: false,
            },
            "eyJ.secret.jwt",
        );
        let debug_output = format!("{user:?}");
        assert!(debug_output.contains("Ana"));
        assert!(!debug_output.contains("eyJ.secret.jwt"));
    }

    #[test]
    fn test_current_user_session_round_trip() {
        let user = CurrentUser::new(
            AccountProfile {
                id: UserId::new("u-1"),
                email: None,
                name: "Ana".to_string(),
                dni: Some("72345678".to_string()),
                phone: None,
                is_admin: true,
            },
            "token",
        );
        let json = serde_json::to_value(&user).unwrap();
        let back: CurrentUser = serde_json::from_value(json).unwrap();
        assert_eq!(back.profile, user.profile);
    }
}
