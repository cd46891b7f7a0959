//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Health check
//! GET  /                            - Dashboard
//! GET  /wishlists?user=<id>         - Wishlist (no user = everyone)
//!
//! # Auth
//! GET  /auth/login                  - Sign-in page
//! POST /auth/login                  - Sign-in action
//! GET  /auth/register               - Sign-up page
//! POST /auth/register               - Sign-up action
//! POST /auth/logout                 - Sign-out action
//!
//! # Items (requires auth)
//! GET  /items/new                   - Create form
//! POST /items                       - Create
//! GET  /items/{id}                  - Detail
//! GET  /items/{id}/edit             - Edit form (owner only)
//! POST /items/{id}                  - Update
//! POST /items/{id}/delete           - Ask for confirmation
//! POST /items/{id}/delete/confirm   - Delete
//! POST /items/{id}/delete/cancel    - Keep the item
//! ```

pub mod auth;
pub mod dashboard;
pub mod items;
pub mod wishlists;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::backend::{AuthSession, BackendError};
use crate::error::{AppError, clear_sentry_user};
use crate::middleware::clear_auth_session;
use crate::services::Snapshot;
use crate::state::AppState;

/// All application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/", get(dashboard::show))
        .route("/wishlists", get(wishlists::show))
        .nest("/auth", auth_routes())
        .merge(item_routes())
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the item routes router.
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/items", post(items::create))
        .route("/items/new", get(items::new_page))
        .route("/items/{id}", get(items::show).post(items::update))
        .route("/items/{id}/edit", get(items::edit_page))
        .route("/items/{id}/delete", post(items::request_delete))
        .route("/items/{id}/delete/confirm", post(items::confirm_delete))
        .route("/items/{id}/delete/cancel", post(items::cancel_delete))
}

/// Liveness health check.
async fn health() -> &'static str {
    "ok"
}

/// Load the read model for a signed-in user.
///
/// A rejected session signs the browser out.
pub(crate) async fn load_snapshot(
    state: &AppState,
    session: &Session,
    auth: &AuthSession,
) -> Result<Snapshot, AppError> {
    match state.sessions().load(auth).await {
        Ok(snapshot) => Ok(snapshot),
        Err(BackendError::Unauthorized) => {
            sign_out_browser(session).await;
            Err(AppError::SessionExpired)
        }
        Err(e) => Err(e.into()),
    }
}

/// Clear the browser session after the backend stopped accepting it.
pub(crate) async fn sign_out_browser(session: &Session) {
    if let Err(e) = clear_auth_session(session).await {
        tracing::warn!(error = %e, "Could not clear browser session");
    }
    clear_sentry_user();
}

/// Link to one user's wishlist.
pub(crate) fn wishlist_href(user: impl std::fmt::Display) -> String {
    format!("/wishlists?user={user}")
}

/// Link to one item's detail page.
pub(crate) fn item_href(id: impl std::fmt::Display) -> String {
    format!("/items/{id}")
}
