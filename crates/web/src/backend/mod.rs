//! Client bindings for the backend service.
//!
//! # Architecture
//!
//! The backend is an external backend-as-a-service offering three things:
//!
//! - [`IdentityService`] - username/password authentication and session tokens
//! - [`ProfileStore`] - the `profiles` table
//! - [`WishlistStore`] - the `wishlist_items` table
//!
//! Each is a trait so handlers and services never depend on the transport.
//! Two implementations exist:
//!
//! - [`SupabaseBackend`] - HTTP adapter for a Supabase project (GoTrue + PostgREST)
//! - [`InMemoryBackend`] - process-local tables with the same semantics
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = Backend::in_memory(&InMemoryBackend::new());
//! let session = backend.identity().sign_in(&username, &password).await?;
//! let items = backend.items().list_items(&session).await?;
//! ```

mod memory;
mod supabase;

pub use memory::InMemoryBackend;
pub use supabase::SupabaseBackend;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use family_wishlist_core::{
    AvatarUrl, ItemDetails, ItemId, Password, Profile, UserId, Username, WishlistItem,
};

use crate::config::{BackendConfig, SupabaseConfig};

/// Tokens are treated as expired this long before their real expiry.
const EXPIRY_LEEWAY_SECONDS: i64 = 30;

/// Capacity of the session event channel.
pub(crate) const SESSION_EVENT_CAPACITY: usize = 64;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The identity service rejected the username/password pair.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The access token is missing, expired or revoked.
    #[error("unauthorized")]
    Unauthorized,

    /// A unique constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Row not found (or not visible to this user).
    #[error("not found: {0}")]
    NotFound(String),

    /// A stored row failed domain validation.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// An authenticated session issued by the identity service.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Identity (and profile) id of the signed-in user.
    pub user_id: UserId,
    access_token: String,
    refresh_token: String,
    /// When the access token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Create a session from raw token values.
    #[must_use]
    pub const fn new(
        user_id: UserId,
        access_token: String,
        refresh_token: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            access_token,
            refresh_token,
            expires_at,
        }
    }

    /// Bearer token for row requests.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Token used to obtain a fresh access token.
    #[must_use]
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Whether the access token should be refreshed before use.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_LEEWAY_SECONDS) >= self.expires_at
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("user_id", &self.user_id)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Result of creating a new identity.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    /// Id of the new identity.
    pub user_id: UserId,
    /// Session, unless the backend requires confirmation before sign-in.
    pub session: Option<AuthSession>,
}

/// Session lifecycle notifications.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SignedIn(AuthSession),
    TokenRefreshed(AuthSession),
    SignedOut(UserId),
}

/// Username/password authentication.
///
/// Implementations decide how a username maps onto the provider's own
/// account model; callers never see that mapping.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Create an identity carrying `{username, avatar_url}` as metadata.
    async fn sign_up(
        &self,
        username: &Username,
        password: &Password,
        avatar_url: Option<&AvatarUrl>,
    ) -> Result<SignUpOutcome, BackendError>;

    /// Authenticate an existing identity.
    async fn sign_in(
        &self,
        username: &Username,
        password: &Password,
    ) -> Result<AuthSession, BackendError>;

    /// Exchange the refresh token for a new session.
    async fn refresh(&self, session: &AuthSession) -> Result<AuthSession, BackendError>;

    /// Look up the user behind a session, validating its access token.
    async fn current_user(&self, session: &AuthSession) -> Result<UserId, BackendError>;

    /// Revoke the session.
    async fn sign_out(&self, session: &AuthSession) -> Result<(), BackendError>;

    /// Subscribe to session lifecycle events.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// The `profiles` table.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// All profiles, projected to `{id, username, avatar_url}`.
    async fn list_profiles(&self, session: &AuthSession) -> Result<Vec<Profile>, BackendError>;

    /// Whether a profile with this username exists. Callable before sign-up.
    async fn username_exists(&self, username: &Username) -> Result<bool, BackendError>;

    /// Insert the profile row for a freshly created identity.
    ///
    /// `session` is `None` when sign-up did not yield a session.
    async fn insert_profile(
        &self,
        session: Option<&AuthSession>,
        profile: &Profile,
    ) -> Result<(), BackendError>;
}

/// The `wishlist_items` table.
#[async_trait]
pub trait WishlistStore: Send + Sync {
    /// All items, newest first.
    async fn list_items(&self, session: &AuthSession) -> Result<Vec<WishlistItem>, BackendError>;

    /// Insert an item owned by `owner`.
    async fn insert_item(
        &self,
        session: &AuthSession,
        owner: UserId,
        details: &ItemDetails,
    ) -> Result<WishlistItem, BackendError>;

    /// Overwrite the mutable fields of an item.
    async fn update_item(
        &self,
        session: &AuthSession,
        id: ItemId,
        details: &ItemDetails,
    ) -> Result<(), BackendError>;

    /// Delete an item by id.
    async fn delete_item(&self, session: &AuthSession, id: ItemId) -> Result<(), BackendError>;
}

/// The three backend seams bundled together.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Backend {
    identity: Arc<dyn IdentityService>,
    profiles: Arc<dyn ProfileStore>,
    items: Arc<dyn WishlistStore>,
}

impl Backend {
    /// Bundle explicit implementations.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityService>,
        profiles: Arc<dyn ProfileStore>,
        items: Arc<dyn WishlistStore>,
    ) -> Self {
        Self {
            identity,
            profiles,
            items,
        }
    }

    /// Build the backend selected by configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        match config {
            BackendConfig::Supabase(supabase) => Self::supabase(supabase),
            BackendConfig::Memory => Ok(Self::in_memory(&InMemoryBackend::new())),
        }
    }

    /// Backend talking to a Supabase project.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn supabase(config: &SupabaseConfig) -> Result<Self, BackendError> {
        let client = Arc::new(SupabaseBackend::new(config)?);
        Ok(Self::new(client.clone(), client.clone(), client))
    }

    /// Backend over a shared in-memory store.
    #[must_use]
    pub fn in_memory(store: &InMemoryBackend) -> Self {
        let store = Arc::new(store.clone());
        Self::new(store.clone(), store.clone(), store)
    }

    #[must_use]
    pub fn identity(&self) -> &dyn IdentityService {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn profiles(&self) -> &dyn ProfileStore {
        self.profiles.as_ref()
    }

    #[must_use]
    pub fn items(&self) -> &dyn WishlistStore {
        self.items.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: DateTime<Utc>) -> AuthSession {
        AuthSession::new(
            UserId::random(),
            "access-token-value".to_string(),
            "refresh-token-value".to_string(),
            expires_at,
        )
    }

    #[test]
    fn test_session_debug_redacts_tokens() {
        let debug = format!("{:?}", session(Utc::now()));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("access-token-value"));
        assert!(!debug.contains("refresh-token-value"));
    }

    #[test]
    fn test_session_expiry_has_leeway() {
        let now = Utc::now();
        assert!(session(now + Duration::seconds(10)).is_expired(now));
        assert!(!session(now + Duration::minutes(5)).is_expired(now));
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "backend returned 500: boom");
    }
}
