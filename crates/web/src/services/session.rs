//! Session controller: per-user read models and session lifecycle.
//!
//! The controller is the source of truth for what a signed-in user sees. It
//! fetches profiles and items from the stores, keeps the last good snapshot
//! per user in a `moka` cache, and listens to the identity service's session
//! events for the lifetime of the process.
//!
//! A failed fetch never replaces a loaded snapshot: the cached one is served
//! and flagged as stale so the page can show a transient notice.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use moka::future::Cache;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::instrument;

use family_wishlist_core::{ItemId, Profile, UserId, WishlistItem, sort_newest_first};

use crate::backend::{AuthSession, Backend, BackendError, SessionEvent};

/// Upper bound on cached read models (one per signed-in user).
const MAX_CACHED_USERS: u64 = 1000;

/// Read models for users who stop making requests are dropped after this.
const CACHE_IDLE: Duration = Duration::from_secs(60 * 60);

/// Everything the views render: all profiles and all items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadModel {
    /// Profiles in store order.
    pub profiles: Vec<Profile>,
    /// Items, newest first.
    pub items: Vec<WishlistItem>,
}

impl ReadModel {
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&WishlistItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn profile(&self, id: UserId) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.id == id)
    }
}

/// A read model plus whether it could be refreshed.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub model: ReadModel,
    /// The fetch failed; `model` is the last good one (or empty).
    pub stale: bool,
}

/// Holds read models and reacts to session events.
///
/// Cheaply cloneable.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<SessionControllerInner>,
}

struct SessionControllerInner {
    backend: Backend,
    cache: Cache<UserId, ReadModel>,
}

impl SessionController {
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CACHED_USERS)
            .time_to_idle(CACHE_IDLE)
            .build();

        Self {
            inner: Arc::new(SessionControllerInner { backend, cache }),
        }
    }

    /// Fetch profiles and items and remember the result.
    ///
    /// # Errors
    ///
    /// Returns the first store error; the cache is left untouched.
    #[instrument(skip_all, fields(user_id = %session.user_id))]
    pub async fn fetch(&self, session: &AuthSession) -> Result<ReadModel, BackendError> {
        let backend = &self.inner.backend;
        let (profiles, mut items) = tokio::try_join!(
            backend.profiles().list_profiles(session),
            backend.items().list_items(session),
        )?;
        sort_newest_first(&mut items);

        let model = ReadModel { profiles, items };
        self.inner
            .cache
            .insert(session.user_id, model.clone())
            .await;
        Ok(model)
    }

    /// Fetch, falling back to the last good read model on failure.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` when the session is no longer
    /// accepted; every other failure degrades to a stale snapshot.
    pub async fn load(&self, session: &AuthSession) -> Result<Snapshot, BackendError> {
        match self.fetch(session).await {
            Ok(model) => Ok(Snapshot {
                model,
                stale: false,
            }),
            Err(BackendError::Unauthorized) => Err(BackendError::Unauthorized),
            Err(e) => {
                tracing::warn!(
                    user_id = %session.user_id,
                    error = %e,
                    "Read model fetch failed; serving last good state"
                );
                let model = self.cached(session.user_id).await.unwrap_or_default();
                Ok(Snapshot { model, stale: true })
            }
        }
    }

    /// Last good read model for a user.
    pub async fn cached(&self, user_id: UserId) -> Option<ReadModel> {
        self.inner.cache.get(&user_id).await
    }

    /// Return a session whose access token is usable, refreshing if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh token is rejected.
    pub async fn ensure_fresh(&self, session: AuthSession) -> Result<AuthSession, BackendError> {
        if !session.is_expired(Utc::now()) {
            return Ok(session);
        }
        self.inner.backend.identity().refresh(&session).await
    }

    /// React to one session event.
    pub async fn handle(&self, event: SessionEvent) {
        match event {
            SessionEvent::SignedIn(session) | SessionEvent::TokenRefreshed(session) => {
                if let Err(e) = self.fetch(&session).await {
                    tracing::warn!(
                        user_id = %session.user_id,
                        error = %e,
                        "Could not warm read model"
                    );
                }
            }
            SessionEvent::SignedOut(user_id) => {
                self.inner.cache.invalidate(&user_id).await;
                tracing::debug!(user_id = %user_id, "Read model cleared");
            }
        }
    }

    /// Subscribe to the identity service and handle events until it goes away.
    #[must_use]
    pub fn spawn_listener(&self) -> JoinHandle<()> {
        let controller = self.clone();
        let mut events = self.inner.backend.identity().subscribe();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => controller.handle(event).await,
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Session listener lagged behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!("Session listener stopped");
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use family_wishlist_core::{ItemDetails, Username};

    use super::*;
    use crate::backend::{InMemoryBackend, ProfileStore};

    async fn signed_in(store: &InMemoryBackend, backend: &Backend, name: &str) -> AuthSession {
        let username = Username::parse(name).unwrap();
        let password = family_wishlist_core::Password::for_sign_up("secret1").unwrap();
        let session = backend
            .identity()
            .sign_up(&username, &password, None)
            .await
            .unwrap()
            .session
            .unwrap();
        store
            .insert_profile(
                Some(&session),
                &Profile {
                    id: session.user_id,
                    username,
                    avatar_url: None,
                },
            )
            .await
            .unwrap();
        session
    }

    fn details(title: &str) -> ItemDetails {
        ItemDetails {
            title: title.to_string(),
            description: None,
            price: None,
            link: None,
            is_priority: false,
        }
    }

    #[tokio::test]
    async fn test_load_fetches_both_collections() {
        let store = InMemoryBackend::new();
        let backend = Backend::in_memory(&store);
        let controller = SessionController::new(backend.clone());
        let session = signed_in(&store, &backend, "alice").await;
        backend
            .items()
            .insert_item(&session, session.user_id, &details("Bike"))
            .await
            .unwrap();

        let snapshot = controller.load(&session).await.unwrap();

        assert!(!snapshot.stale);
        assert_eq!(snapshot.model.profiles.len(), 1);
        assert_eq!(snapshot.model.items.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_last_good_state() {
        let store = InMemoryBackend::new();
        let backend = Backend::in_memory(&store);
        let controller = SessionController::new(backend.clone());
        let session = signed_in(&store, &backend, "alice").await;
        backend
            .items()
            .insert_item(&session, session.user_id, &details("Bike"))
            .await
            .unwrap();
        controller.load(&session).await.unwrap();

        store.fail_reads(true);
        let snapshot = controller.load(&session).await.unwrap();

        assert!(snapshot.stale);
        assert_eq!(snapshot.model.items.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_first_fetch_is_empty_and_stale() {
        let store = InMemoryBackend::new();
        let backend = Backend::in_memory(&store);
        let controller = SessionController::new(backend.clone());
        let session = signed_in(&store, &backend, "alice").await;

        store.fail_reads(true);
        let snapshot = controller.load(&session).await.unwrap();

        assert!(snapshot.stale);
        assert_eq!(snapshot.model, ReadModel::default());
    }

    #[tokio::test]
    async fn test_revoked_session_is_unauthorized() {
        let store = InMemoryBackend::new();
        let backend = Backend::in_memory(&store);
        let controller = SessionController::new(backend.clone());
        let session = signed_in(&store, &backend, "alice").await;

        store.revoke_all_sessions();

        assert!(matches!(
            controller.load(&session).await,
            Err(BackendError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_signed_out_event_clears_cache() {
        let store = InMemoryBackend::new();
        let backend = Backend::in_memory(&store);
        let controller = SessionController::new(backend.clone());
        let session = signed_in(&store, &backend, "alice").await;

        controller.handle(SessionEvent::SignedIn(session.clone())).await;
        assert!(controller.cached(session.user_id).await.is_some());

        controller.handle(SessionEvent::SignedOut(session.user_id)).await;
        assert!(controller.cached(session.user_id).await.is_none());
    }

    #[tokio::test]
    async fn test_listener_warms_cache_on_sign_in() {
        let store = InMemoryBackend::new();
        let backend = Backend::in_memory(&store);
        let controller = SessionController::new(backend.clone());
        let listener = controller.spawn_listener();

        signed_in(&store, &backend, "alice").await;
        // Sign in again now that the profile row exists.
        let session = backend
            .identity()
            .sign_in(
                &Username::parse("alice").unwrap(),
                &family_wishlist_core::Password::for_sign_in("secret1").unwrap(),
            )
            .await
            .unwrap();

        let mut warmed = None;
        for _ in 0..50 {
            warmed = controller.cached(session.user_id).await;
            if warmed.as_ref().is_some_and(|m| !m.profiles.is_empty()) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(warmed.unwrap().profiles.len(), 1);
        listener.abort();
    }

    #[tokio::test]
    async fn test_ensure_fresh_refreshes_expired_token() {
        let store = InMemoryBackend::new();
        let backend = Backend::in_memory(&store);
        let controller = SessionController::new(backend.clone());
        store.set_token_ttl(chrono::Duration::seconds(0));
        let session = signed_in_without_profile(&backend).await;
        store.set_token_ttl(chrono::Duration::hours(1));

        let fresh = controller.ensure_fresh(session.clone()).await.unwrap();

        assert_ne!(fresh.access_token(), session.access_token());
        assert!(!fresh.is_expired(Utc::now()));
    }

    async fn signed_in_without_profile(backend: &Backend) -> AuthSession {
        backend
            .identity()
            .sign_up(
                &Username::parse("carol").unwrap(),
                &family_wishlist_core::Password::for_sign_up("secret1").unwrap(),
                None,
            )
            .await
            .unwrap()
            .session
            .unwrap()
    }
}
