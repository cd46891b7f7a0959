//! Session middleware configuration.
//!
//! Browser sessions live in process memory via tower-sessions, in a bounded
//! [`MokaSessionStore`]. They only hold backend tokens and the pending
//! deletion, so losing them on restart just means signing in again.

use std::time::Duration;

use tower_sessions::{Expiry, SessionManagerLayer};

use super::session_store::MokaSessionStore;
use crate::config::WishlistConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "fw_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer.
#[must_use]
pub fn create_session_layer(config: &WishlistConfig) -> SessionManagerLayer<MokaSessionStore> {
    let store = MokaSessionStore::new(Duration::from_secs(SESSION_EXPIRY_SECONDS.unsigned_abs()));
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
