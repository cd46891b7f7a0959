//! Wishlist mutations.
//!
//! Each command checks ownership against the acting session, issues exactly
//! one store call, and returns a freshly fetched read model. A command for a
//! form that is already being submitted by the same user is rejected without
//! touching the store.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use thiserror::Error;

use family_wishlist_core::{ItemDetails, ItemId, UserId};

use crate::backend::{AuthSession, Backend, BackendError};
use crate::services::session::{SessionController, Snapshot};

/// Errors from wishlist commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The same form is already being submitted.
    #[error("submission already in progress")]
    InFlight,

    /// The item belongs to someone else.
    #[error("item {0} is not owned by the acting user")]
    NotOwner(ItemId),

    /// The item does not exist (or is no longer visible).
    #[error("item {0} not found")]
    NotFound(ItemId),

    /// Store call failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Which form a submission comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormTarget {
    Create,
    Update(ItemId),
    Delete(ItemId),
}

/// Submissions currently waiting on the store, keyed by user and form.
///
/// Cheaply cloneable; clones share the registry.
#[derive(Clone, Default)]
pub struct InFlightRegistry {
    entries: Arc<DashMap<(UserId, FormTarget), ()>>,
}

impl InFlightRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a form for submission.
    ///
    /// Returns `None` if the same user already has this form in flight. The
    /// claim is released when the guard is dropped.
    #[must_use]
    pub fn try_claim(&self, user_id: UserId, target: FormTarget) -> Option<InFlightGuard> {
        match self.entries.entry((user_id, target)) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(InFlightGuard {
                    registry: self.clone(),
                    key: (user_id, target),
                })
            }
        }
    }

    #[must_use]
    pub fn is_in_flight(&self, user_id: UserId, target: FormTarget) -> bool {
        self.entries.contains_key(&(user_id, target))
    }
}

/// Releases an in-flight claim on drop.
pub struct InFlightGuard {
    registry: InFlightRegistry,
    key: (UserId, FormTarget),
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.entries.remove(&self.key);
    }
}

/// Wishlist mutation commands.
pub struct WishlistCommands<'a> {
    backend: &'a Backend,
    controller: &'a SessionController,
    in_flight: &'a InFlightRegistry,
}

impl<'a> WishlistCommands<'a> {
    #[must_use]
    pub const fn new(
        backend: &'a Backend,
        controller: &'a SessionController,
        in_flight: &'a InFlightRegistry,
    ) -> Self {
        Self {
            backend,
            controller,
            in_flight,
        }
    }

    /// Add an item to the acting user's list.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InFlight` for a duplicate submission and
    /// `CommandError::Backend` if the insert fails.
    pub async fn create(
        &self,
        session: &AuthSession,
        details: &ItemDetails,
    ) -> Result<Snapshot, CommandError> {
        let _claim = self.claim(session.user_id, FormTarget::Create)?;

        let item = self
            .backend
            .items()
            .insert_item(session, session.user_id, details)
            .await?;
        tracing::info!(user_id = %session.user_id, item_id = %item.id, "Wish added");

        self.refreshed(session).await
    }

    /// Overwrite an item's mutable fields.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::NotOwner` or `CommandError::NotFound` without
    /// calling the store, `CommandError::InFlight` for a duplicate
    /// submission, and `CommandError::Backend` if the update fails.
    pub async fn update(
        &self,
        session: &AuthSession,
        id: ItemId,
        details: &ItemDetails,
    ) -> Result<Snapshot, CommandError> {
        self.check_owner(session, id).await?;
        let _claim = self.claim(session.user_id, FormTarget::Update(id))?;

        self.backend
            .items()
            .update_item(session, id, details)
            .await
            .map_err(|e| not_found_as(e, id))?;
        tracing::info!(user_id = %session.user_id, item_id = %id, "Wish updated");

        self.refreshed(session).await
    }

    /// Permanently remove an item. Callers must have confirmed the deletion.
    ///
    /// # Errors
    ///
    /// Same as [`update`](Self::update).
    pub async fn delete(&self, session: &AuthSession, id: ItemId) -> Result<Snapshot, CommandError> {
        self.check_owner(session, id).await?;
        let _claim = self.claim(session.user_id, FormTarget::Delete(id))?;

        self.backend
            .items()
            .delete_item(session, id)
            .await
            .map_err(|e| not_found_as(e, id))?;
        tracing::info!(user_id = %session.user_id, item_id = %id, "Wish deleted");

        self.refreshed(session).await
    }

    fn claim(&self, user_id: UserId, target: FormTarget) -> Result<InFlightGuard, CommandError> {
        self.in_flight.try_claim(user_id, target).ok_or_else(|| {
            tracing::debug!(user_id = %user_id, ?target, "Duplicate submission ignored");
            CommandError::InFlight
        })
    }

    /// Ownership is checked against the latest read model before any write.
    async fn check_owner(&self, session: &AuthSession, id: ItemId) -> Result<(), CommandError> {
        let model = match self.controller.cached(session.user_id).await {
            Some(model) if model.item(id).is_some() => model,
            _ => self.controller.fetch(session).await?,
        };

        let item = model.item(id).ok_or(CommandError::NotFound(id))?;
        if !item.is_owned_by(session.user_id) {
            tracing::warn!(user_id = %session.user_id, item_id = %id, "Mutation of another user's item refused");
            return Err(CommandError::NotOwner(id));
        }
        Ok(())
    }

    async fn refreshed(&self, session: &AuthSession) -> Result<Snapshot, CommandError> {
        Ok(self.controller.load(session).await?)
    }
}

fn not_found_as(error: BackendError, id: ItemId) -> CommandError {
    match error {
        BackendError::NotFound(_) => CommandError::NotFound(id),
        other => CommandError::Backend(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use family_wishlist_core::{ItemForm, Price};

    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::services::IdentityFlow;

    struct Fixture {
        store: InMemoryBackend,
        backend: Backend,
        controller: SessionController,
        in_flight: InFlightRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            let store = InMemoryBackend::new();
            let backend = Backend::in_memory(&store);
            let controller = SessionController::new(backend.clone());
            Self {
                store,
                backend,
                controller,
                in_flight: InFlightRegistry::new(),
            }
        }

        fn commands(&self) -> WishlistCommands<'_> {
            WishlistCommands::new(&self.backend, &self.controller, &self.in_flight)
        }

        async fn user(&self, name: &str) -> AuthSession {
            IdentityFlow::new(&self.backend)
                .sign_up(name, "secret1", "")
                .await
                .unwrap()
                .session
                .unwrap()
        }
    }

    fn details(title: &str, price: &str) -> ItemDetails {
        ItemForm {
            title: title.to_string(),
            price: price.to_string(),
            ..ItemForm::default()
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_returns_refreshed_model() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;

        let snapshot = fx.commands().create(&alice, &details("Bike", "")).await.unwrap();

        assert_eq!(snapshot.model.items.len(), 1);
        let item = &snapshot.model.items[0];
        assert_eq!(item.title, "Bike");
        assert!(item.price.is_none());
        assert_eq!(item.owner_id, alice.user_id);
    }

    #[tokio::test]
    async fn test_update_by_owner() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let snapshot = fx.commands().create(&alice, &details("Bike", "")).await.unwrap();
        let id = snapshot.model.items[0].id;

        let snapshot = fx
            .commands()
            .update(&alice, id, &details("Red bike", "9"))
            .await
            .unwrap();

        let item = snapshot.model.item(id).unwrap();
        assert_eq!(item.title, "Red bike");
        assert_eq!(item.price, Some(Price::parse("9").unwrap()));
    }

    #[tokio::test]
    async fn test_non_owner_mutations_never_reach_store() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;
        let snapshot = fx.commands().create(&alice, &details("Bike", "")).await.unwrap();
        let id = snapshot.model.items[0].id;
        let before = fx.store.item_mutations();

        let update = fx.commands().update(&bob, id, &details("Mine", "")).await;
        let delete = fx.commands().delete(&bob, id).await;

        assert!(matches!(update, Err(CommandError::NotOwner(_))));
        assert!(matches!(delete, Err(CommandError::NotOwner(_))));
        assert_eq!(fx.store.item_mutations(), before);
    }

    #[tokio::test]
    async fn test_delete_unknown_item() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;

        let result = fx.commands().delete(&alice, ItemId::random()).await;
        assert!(matches!(result, Err(CommandError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_create_is_rejected_while_in_flight() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        fx.store.set_latency(Duration::from_millis(100));

        let form = details("Bike", "");
        let commands = fx.commands();
        let (first, second) = tokio::join!(
            commands.create(&alice, &form),
            commands.create(&alice, &form),
        );

        let outcomes = [first.is_ok(), second.is_ok()];
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
        assert_eq!(fx.store.item_mutations(), 1);
        assert!(!fx.in_flight.is_in_flight(alice.user_id, FormTarget::Create));
    }

    #[tokio::test]
    async fn test_failed_write_releases_claim() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        fx.store.fail_writes(true);

        let result = fx.commands().create(&alice, &details("Bike", "")).await;
        assert!(matches!(result, Err(CommandError::Backend(_))));

        fx.store.fail_writes(false);
        assert!(fx.commands().create(&alice, &details("Bike", "")).await.is_ok());
    }

    #[test]
    fn test_registry_claims_are_per_user_and_form() {
        let registry = InFlightRegistry::new();
        let alice = UserId::random();
        let bob = UserId::random();

        let claim = registry.try_claim(alice, FormTarget::Create).unwrap();
        assert!(registry.try_claim(alice, FormTarget::Create).is_none());
        assert!(registry.try_claim(bob, FormTarget::Create).is_some());
        assert!(
            registry
                .try_claim(alice, FormTarget::Update(ItemId::random()))
                .is_some()
        );

        drop(claim);
        assert!(registry.try_claim(alice, FormTarget::Create).is_some());
    }
}
