//! Supabase adapter: GoTrue for identity, PostgREST for rows.
//!
//! Every request carries the project's anonymous key as `apikey`. Row
//! requests made on behalf of a user carry that user's access token as the
//! bearer so row-level policies apply; anonymous row reads fall back to the
//! anonymous key.

mod auth;
mod dto;
mod rest;

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::broadcast;
use url::Url;

use family_wishlist_core::Username;

use super::{BackendError, SESSION_EVENT_CAPACITY, SessionEvent};
use crate::config::SupabaseConfig;

/// Longest response body excerpt kept in logs and errors.
const MAX_LOGGED_BODY: usize = 500;

/// HTTP client for a Supabase project.
///
/// Implements [`IdentityService`](super::IdentityService),
/// [`ProfileStore`](super::ProfileStore) and
/// [`WishlistStore`](super::WishlistStore). Cheaply cloneable.
#[derive(Clone)]
pub struct SupabaseBackend {
    inner: Arc<SupabaseBackendInner>,
}

struct SupabaseBackendInner {
    client: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    identity_domain: String,
    events: broadcast::Sender<SessionEvent>,
}

impl SupabaseBackend {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(config.anon_key.expose_secret()).map_err(|e| {
            BackendError::Status {
                status: 0,
                message: format!("invalid API key format: {e}"),
            }
        })?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(SupabaseBackendInner {
                client,
                base_url: config.url.clone(),
                anon_key: config.anon_key.clone(),
                identity_domain: config.identity_domain.clone(),
                events,
            }),
        })
    }

    /// Login address the identity provider knows this username by.
    fn identity_address(&self, username: &Username) -> String {
        format!("{}@{}", username.as_str(), self.inner.identity_domain)
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| BackendError::Status {
                status: 0,
                message: format!("invalid endpoint {path}: {e}"),
            })
    }

    /// Attach a bearer token, or the anonymous key when there is no user.
    fn with_bearer(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        let token = token.unwrap_or_else(|| self.inner.anon_key.expose_secret());
        request.bearer_auth(token)
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine: nobody is listening yet.
        let _ = self.inner.events.send(event);
    }
}

/// Turn a non-success response into an error, logging a truncated body.
async fn error_from_response(response: Response, context: &str) -> BackendError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(MAX_LOGGED_BODY).collect();

    tracing::error!(
        status = %status,
        body = %excerpt,
        "Backend request failed: {context}"
    );

    match status {
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized,
        StatusCode::CONFLICT => BackendError::Conflict(excerpt),
        _ => BackendError::Status {
            status: status.as_u16(),
            message: excerpt,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config() -> SupabaseConfig {
        SupabaseConfig {
            url: Url::parse("https://abcd.supabase.co").unwrap(),
            anon_key: SecretString::from("eyJhbGciOiJIUzI1NiJ9.eyJyb2xlIjoiYW5vbiJ9.c2ln"),
            identity_domain: "christmas.wishlist".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_identity_address() {
        let backend = SupabaseBackend::new(&config()).unwrap();
        let username = Username::parse("alice").unwrap();
        assert_eq!(
            backend.identity_address(&username),
            "alice@christmas.wishlist"
        );
    }

    #[test]
    fn test_endpoint_joins_base() {
        let backend = SupabaseBackend::new(&config()).unwrap();
        let url = backend.endpoint("rest/v1/profiles").unwrap();
        assert_eq!(url.as_str(), "https://abcd.supabase.co/rest/v1/profiles");
    }
}
