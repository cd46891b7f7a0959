//! Process-local backend.
//!
//! Mirrors the hosted backend's observable behavior: unique usernames,
//! store-assigned timestamps, bearer-token checks, and row policies that make
//! other users' items invisible to update and delete. Used by the test suites
//! and by `WISHLIST_BACKEND=memory` for local runs.
//!
//! Test hooks (failure injection, latency, token lifetime, mutation counter)
//! are plain methods; they have no effect unless called.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::distr::{Alphanumeric, SampleString};
use tokio::sync::broadcast;

use family_wishlist_core::{
    AvatarUrl, ItemDetails, ItemId, Password, Profile, UserId, Username, WishlistItem,
};

use super::{
    AuthSession, BackendError, IdentityService, ProfileStore, SESSION_EVENT_CAPACITY,
    SessionEvent, SignUpOutcome, WishlistStore,
};

const TOKEN_LENGTH: usize = 40;
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;

struct Account {
    user_id: UserId,
    password: String,
}

struct Grant {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

/// In-memory implementation of all three backend seams.
///
/// Clones share the same tables.
#[derive(Clone)]
pub struct InMemoryBackend {
    inner: Arc<InMemoryInner>,
}

struct InMemoryInner {
    /// Keyed by [`account_key`], so usernames differing only in case collide.
    accounts: DashMap<String, Account>,
    /// Profiles with their insertion sequence, for stable listing order.
    profiles: DashMap<UserId, (u64, Profile)>,
    items: DashMap<ItemId, WishlistItem>,
    access_tokens: DashMap<String, Grant>,
    refresh_tokens: DashMap<String, UserId>,
    sequence: AtomicU64,
    /// Last assigned `created_at`, in microseconds.
    clock: AtomicI64,
    token_ttl_seconds: AtomicI64,
    latency_ms: AtomicU64,
    item_mutations: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_profile_insert: AtomicBool,
    require_confirmation: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            inner: Arc::new(InMemoryInner {
                accounts: DashMap::new(),
                profiles: DashMap::new(),
                items: DashMap::new(),
                access_tokens: DashMap::new(),
                refresh_tokens: DashMap::new(),
                sequence: AtomicU64::new(0),
                clock: AtomicI64::new(0),
                token_ttl_seconds: AtomicI64::new(DEFAULT_TOKEN_TTL_SECONDS),
                latency_ms: AtomicU64::new(0),
                item_mutations: AtomicUsize::new(0),
                fail_reads: AtomicBool::new(false),
                fail_writes: AtomicBool::new(false),
                fail_profile_insert: AtomicBool::new(false),
                require_confirmation: AtomicBool::new(false),
                events,
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Test hooks
    // -------------------------------------------------------------------------

    /// Make every list call fail.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every item insert, update and delete fail.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make profile inserts fail (identity creation still succeeds).
    pub fn fail_profile_insert(&self, fail: bool) {
        self.inner.fail_profile_insert.store(fail, Ordering::SeqCst);
    }

    /// Sign-up creates the identity but returns no session.
    pub fn require_confirmation(&self, require: bool) {
        self.inner
            .require_confirmation
            .store(require, Ordering::SeqCst);
    }

    /// Delay applied to every item mutation.
    pub fn set_latency(&self, latency: StdDuration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.inner.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Lifetime of access tokens issued from now on.
    pub fn set_token_ttl(&self, ttl: Duration) {
        self.inner
            .token_ttl_seconds
            .store(ttl.num_seconds(), Ordering::SeqCst);
    }

    /// Invalidate every issued token, access and refresh alike.
    pub fn revoke_all_sessions(&self) {
        self.inner.access_tokens.clear();
        self.inner.refresh_tokens.clear();
    }

    /// Number of item mutations that reached the table.
    #[must_use]
    pub fn item_mutations(&self) -> usize {
        self.inner.item_mutations.load(Ordering::SeqCst)
    }

    /// Whether an identity exists for this username.
    #[must_use]
    pub fn has_identity(&self, username: &Username) -> bool {
        self.inner.accounts.contains_key(&account_key(username))
    }

    /// Identity id registered for this username.
    #[must_use]
    pub fn user_id(&self, username: &Username) -> Option<UserId> {
        self.inner
            .accounts
            .get(&account_key(username))
            .map(|account| account.user_id)
    }

    /// Profile row for this user, if any.
    #[must_use]
    pub fn profile(&self, user_id: UserId) -> Option<Profile> {
        self.inner.profiles.get(&user_id).map(|entry| entry.1.clone())
    }

    /// Every stored item, in no particular order.
    #[must_use]
    pub fn all_items(&self) -> Vec<WishlistItem> {
        self.inner
            .items
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn issue_session(&self, user_id: UserId) -> AuthSession {
        let mut rng = rand::rng();
        let access = Alphanumeric.sample_string(&mut rng, TOKEN_LENGTH);
        let refresh = Alphanumeric.sample_string(&mut rng, TOKEN_LENGTH);
        let ttl = self.inner.token_ttl_seconds.load(Ordering::SeqCst);
        let expires_at = Utc::now() + Duration::seconds(ttl);

        self.inner
            .access_tokens
            .insert(access.clone(), Grant { user_id, expires_at });
        self.inner.refresh_tokens.insert(refresh.clone(), user_id);

        AuthSession::new(user_id, access, refresh, expires_at)
    }

    /// Resolve a bearer token to its user, like a row policy would.
    fn authorize(&self, session: &AuthSession) -> Result<UserId, BackendError> {
        let grant = self
            .inner
            .access_tokens
            .get(session.access_token())
            .ok_or(BackendError::Unauthorized)?;
        if grant.expires_at <= Utc::now() {
            return Err(BackendError::Unauthorized);
        }
        Ok(grant.user_id)
    }

    /// Strictly increasing creation timestamps.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_micros();
        let previous = self
            .inner
            .clock
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        let assigned = now.max(previous + 1);
        DateTime::from_timestamp_micros(assigned).unwrap_or_else(Utc::now)
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.inner.events.send(event);
    }

    fn check_reads(&self) -> Result<(), BackendError> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }

    async fn before_write(&self) -> Result<(), BackendError> {
        let latency = self.inner.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(StdDuration::from_millis(latency)).await;
        }
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }
}

/// Identity lookup key. The hosted identity provider lowercases login
/// addresses, so case is folded the same way here.
fn account_key(username: &Username) -> String {
    username.as_str().to_ascii_lowercase()
}

fn injected_failure() -> BackendError {
    BackendError::Status {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

#[async_trait]
impl IdentityService for InMemoryBackend {
    async fn sign_up(
        &self,
        username: &Username,
        password: &Password,
        _avatar_url: Option<&AvatarUrl>,
    ) -> Result<SignUpOutcome, BackendError> {
        let user_id = UserId::random();
        match self.inner.accounts.entry(account_key(username)) {
            Entry::Occupied(_) => {
                return Err(BackendError::Conflict(
                    "identity already registered".to_string(),
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(Account {
                    user_id,
                    password: password.expose().to_string(),
                });
            }
        }

        let session = if self.inner.require_confirmation.load(Ordering::SeqCst) {
            None
        } else {
            let session = self.issue_session(user_id);
            self.emit(SessionEvent::SignedIn(session.clone()));
            Some(session)
        };

        Ok(SignUpOutcome { user_id, session })
    }

    async fn sign_in(
        &self,
        username: &Username,
        password: &Password,
    ) -> Result<AuthSession, BackendError> {
        let user_id = {
            let account = self
                .inner
                .accounts
                .get(&account_key(username))
                .ok_or(BackendError::InvalidCredentials)?;
            if account.password != password.expose() {
                return Err(BackendError::InvalidCredentials);
            }
            account.user_id
        };

        let session = self.issue_session(user_id);
        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn refresh(&self, session: &AuthSession) -> Result<AuthSession, BackendError> {
        let (_, user_id) = self
            .inner
            .refresh_tokens
            .remove(session.refresh_token())
            .ok_or(BackendError::Unauthorized)?;
        self.inner.access_tokens.remove(session.access_token());

        let refreshed = self.issue_session(user_id);
        self.emit(SessionEvent::TokenRefreshed(refreshed.clone()));
        Ok(refreshed)
    }

    async fn current_user(&self, session: &AuthSession) -> Result<UserId, BackendError> {
        self.authorize(session)
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), BackendError> {
        self.inner.access_tokens.remove(session.access_token());
        self.inner.refresh_tokens.remove(session.refresh_token());
        self.emit(SessionEvent::SignedOut(session.user_id));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }
}

#[async_trait]
impl ProfileStore for InMemoryBackend {
    async fn list_profiles(&self, session: &AuthSession) -> Result<Vec<Profile>, BackendError> {
        self.authorize(session)?;
        self.check_reads()?;

        let mut rows: Vec<(u64, Profile)> = self
            .inner
            .profiles
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        Ok(rows.into_iter().map(|(_, profile)| profile).collect())
    }

    async fn username_exists(&self, username: &Username) -> Result<bool, BackendError> {
        self.check_reads()?;
        Ok(self
            .inner
            .profiles
            .iter()
            .any(|entry| entry.value().1.username == *username))
    }

    async fn insert_profile(
        &self,
        session: Option<&AuthSession>,
        profile: &Profile,
    ) -> Result<(), BackendError> {
        if let Some(session) = session {
            self.authorize(session)?;
        }
        if self.inner.fail_profile_insert.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        if self.username_exists(&profile.username).await? {
            return Err(BackendError::Conflict(format!(
                "username {} already exists",
                profile.username
            )));
        }

        let seq = self.inner.sequence.fetch_add(1, Ordering::SeqCst);
        self.inner.profiles.insert(profile.id, (seq, profile.clone()));
        Ok(())
    }
}

#[async_trait]
impl WishlistStore for InMemoryBackend {
    async fn list_items(&self, session: &AuthSession) -> Result<Vec<WishlistItem>, BackendError> {
        self.authorize(session)?;
        self.check_reads()?;

        let mut items = self.all_items();
        family_wishlist_core::sort_newest_first(&mut items);
        Ok(items)
    }

    async fn insert_item(
        &self,
        session: &AuthSession,
        owner: UserId,
        details: &ItemDetails,
    ) -> Result<WishlistItem, BackendError> {
        let caller = self.authorize(session)?;
        if caller != owner {
            return Err(BackendError::Status {
                status: 403,
                message: "row violates policy".to_string(),
            });
        }
        self.before_write().await?;

        let item = WishlistItem {
            id: ItemId::random(),
            owner_id: owner,
            title: details.title.clone(),
            description: details.description.clone(),
            price: details.price,
            link: details.link.clone(),
            is_priority: details.is_priority,
            created_at: self.next_timestamp(),
        };
        self.inner.items.insert(item.id, item.clone());
        self.inner.item_mutations.fetch_add(1, Ordering::SeqCst);
        Ok(item)
    }

    async fn update_item(
        &self,
        session: &AuthSession,
        id: ItemId,
        details: &ItemDetails,
    ) -> Result<(), BackendError> {
        let caller = self.authorize(session)?;
        self.before_write().await?;

        let mut item = self
            .inner
            .items
            .get_mut(&id)
            .filter(|item| item.owner_id == caller)
            .ok_or_else(|| BackendError::NotFound(format!("wishlist item {id}")))?;
        item.title.clone_from(&details.title);
        item.description.clone_from(&details.description);
        item.price = details.price;
        item.link.clone_from(&details.link);
        item.is_priority = details.is_priority;
        drop(item);

        self.inner.item_mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_item(&self, session: &AuthSession, id: ItemId) -> Result<(), BackendError> {
        let caller = self.authorize(session)?;
        self.before_write().await?;

        self.inner
            .items
            .remove_if(&id, |_, item| item.owner_id == caller)
            .ok_or_else(|| BackendError::NotFound(format!("wishlist item {id}")))?;

        self.inner.item_mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
