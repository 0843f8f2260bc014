//! Authentication route handlers.
//!
//! Email/password accounts backed by GoTrue. A successful sign-in stores the
//! profile and access token in the session; the cart and any checkout in
//! progress are kept across sign-in and sign-out.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ruway_core::{AccountProfile, Email};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{RegistrationForm, SignUpOutcome};
use crate::state::AppState;

/// Login request.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Who is signed in.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AccountProfile>,
}

impl MeResponse {
    fn signed_in(user: &CurrentUser) -> Self {
        Self {
            authenticated: true,
            user: Some(user.profile.clone()),
        }
    }

    const fn guest() -> Self {
        Self {
            authenticated: false,
            user: None,
        }
    }
}

/// Registration accepted but the email must be confirmed first.
#[derive(Debug, Serialize)]
pub struct ConfirmationRequired {
    pub confirmation_required: bool,
    pub email: Email,
}

async fn start_session(session: &Session, user: &CurrentUser) -> Result<()> {
    set_current_user(session, user).await?;
    set_sentry_user(&user.profile.id);
    Ok(())
}

/// Sign in with email and password.
#[instrument(skip(state, session, request))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<MeResponse>> {
    let user = state
        .auth()
        .sign_in(&request.email, &request.password)
        .await?;
    start_session(&session, &user).await?;

    Ok(Json(MeResponse::signed_in(&user)))
}

/// Register a new customer.
///
/// Answers 201 with the signed-in user, or 202 when the backend requires
/// email confirmation before the first sign-in.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RegistrationForm>,
) -> Result<Response> {
    match state.auth().sign_up(&form).await? {
        SignUpOutcome::SignedIn(user) => {
            start_session(&session, &user).await?;
            Ok((StatusCode::CREATED, Json(MeResponse::signed_in(&user))).into_response())
        }
        SignUpOutcome::ConfirmationRequired { email } => Ok((
            StatusCode::ACCEPTED,
            Json(ConfirmationRequired {
                confirmation_required: true,
                email,
            }),
        )
            .into_response()),
    }
}

/// Sign out.
///
/// The local session is always cleared, even if revoking the token on the
/// backend fails.
#[instrument(skip(state, session, user))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<MeResponse>> {
    if let Some(user) = user {
        if let Err(e) = state.auth().sign_out(&user).await {
            tracing::warn!(error = %e, "Failed to revoke backend session");
        }
    }

    clear_current_user(&session).await?;
    clear_sentry_user();

    Ok(Json(MeResponse::guest()))
}

/// The current user, if any.
#[instrument(skip(user))]
pub async fn me(OptionalAuth(user): OptionalAuth) -> Json<MeResponse> {
    Json(user.as_ref().map_or_else(MeResponse::guest, MeResponse::signed_in))
}
