//! Supabase client.
//!
//! # Architecture
//!
//! - PostgREST (`/rest/v1/{table}`) for catalog, settings and profile rows
//! - GoTrue (`/auth/v1/...`) for sign-in, sign-up and sign-out
//! - Every request carries the anon key as `apikey`; the bearer token is the
//!   signed-in user's access token when there is one, otherwise the anon key
//!
//! Raw rows are defined in [`types`] and normalized into domain types in
//! [`conversions`]. Caching lives one layer up, in the catalog accessor.

pub mod conversions;
pub mod types;

use std::sync::Arc;

use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::SupabaseConfig;

/// Maximum number of body characters kept for diagnostics.
const BODY_LOG_LIMIT: usize = 500;
const BODY_MESSAGE_LIMIT: usize = 200;

/// Errors that can occur when talking to Supabase.
#[derive(Debug, Error)]
pub enum BaasError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with the backend's message.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Rate limited by Supabase.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl BaasError {
    /// HTTP status returned by the backend, if the request got that far.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RateLimited(_) => Some(429),
            _ => None,
        }
    }
}

// =============================================================================
// SupabaseClient
// =============================================================================

/// Client for a Supabase project's REST and auth APIs.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    rest_url: Url,
    auth_url: Url,
    anon_key: SecretString,
}

impl SupabaseClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `BaasError::Url` if the endpoint URLs cannot be derived from
    /// the project URL.
    pub fn new(config: &SupabaseConfig) -> Result<Self, BaasError> {
        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client: reqwest::Client::new(),
                rest_url: config.url.join("rest/v1/")?,
                auth_url: config.url.join("auth/v1/")?,
                anon_key: config.anon_key.clone(),
            }),
        })
    }

    // =========================================================================
    // PostgREST
    // =========================================================================

    /// Select rows from `table` with PostgREST query parameters.
    ///
    /// `access_token` scopes the request to a signed-in user (row-level
    /// security); `None` reads as the anonymous role.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a JSON array
    /// of `T`.
    #[instrument(skip(self, query, access_token), fields(table = %table))]
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
        access_token: Option<&SecretString>,
    ) -> Result<Vec<T>, BaasError> {
        let url = self.inner.rest_url.join(table)?;
        let request = self.inner.client.get(url).query(query);
        self.execute(self.authorize(request, access_token)).await
    }

    // =========================================================================
    // GoTrue
    // =========================================================================

    /// POST a JSON body to an auth endpoint as the anonymous role.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response does not parse.
    #[instrument(skip(self, query, body), fields(path = %path))]
    pub async fn auth_post<B, T>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<T, BaasError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.inner.auth_url.join(path)?;
        let request = self.inner.client.post(url).query(query).json(body);
        self.execute(self.authorize(request, None)).await
    }

    /// POST to an auth endpoint on behalf of a signed-in user, ignoring the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, access_token), fields(path = %path))]
    pub async fn auth_post_empty(
        &self,
        path: &str,
        access_token: &SecretString,
    ) -> Result<(), BaasError> {
        let url = self.inner.auth_url.join(path)?;
        let request = self.inner.client.post(url);
        self.send(self.authorize(request, Some(access_token)))
            .await
            .map(drop)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    fn authorize(
        &self,
        request: RequestBuilder,
        access_token: Option<&SecretString>,
    ) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.inner.anon_key);
        request
            .header("apikey", self.inner.anon_key.expose_secret())
            .bearer_auth(bearer.expose_secret())
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, BaasError> {
        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BaasError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %truncate(&body, BODY_LOG_LIMIT),
                    "Supabase returned server error"
                );
            } else {
                tracing::debug!(
                    status = %status,
                    body = %truncate(&body, BODY_LOG_LIMIT),
                    "Supabase rejected request"
                );
            }
            return Err(BaasError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(body)
    }

    /// Send a request and parse the JSON body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BaasError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body, BODY_LOG_LIMIT),
                "Failed to parse Supabase response"
            );
            BaasError::Parse(e)
        })
    }
}

/// Pull a human-readable message out of a PostgREST or GoTrue error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(String::from))
        })
        .unwrap_or_else(|| truncate(body, BODY_MESSAGE_LIMIT))
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baas_error_display() {
        let err = BaasError::Status {
            status: 400,
            message: "Invalid login credentials".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 400: Invalid login credentials");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = BaasError::RateLimited(30);
        assert_eq!(err.to_string(), "Rate limited, retry after 30 seconds");
        assert_eq!(err.status(), Some(429));
    }

    #[test]
    fn test_error_message_gotrue_shapes() {
        assert_eq!(
            error_message(r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#),
            "Email not confirmed"
        );
    }

    #[test]
    fn test_error_message_postgrest_shape() {
        assert_eq!(
            error_message(r#"{"code":"42P01","message":"relation \"public.nope\" does not exist"}"#),
            "relation \"public.nope\" does not exist"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_truncated_body() {
        let body = "x".repeat(1000);
        assert_eq!(error_message(&body).len(), BODY_MESSAGE_LIMIT);
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }
}
