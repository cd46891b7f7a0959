//! Authentication extractors.
//!
//! The browser session stores the backend [`AuthSession`]. `RequireAuth`
//! refreshes an expired access token before handing it to the handler; when
//! the refresh is refused the browser session is cleared and the user is sent
//! back to sign in.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::backend::AuthSession;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{Notice, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// ```rust,ignore
/// async fn handler(RequireAuth(auth): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user_id)
/// }
/// ```
pub struct RequireAuth(pub AuthSession);

/// Why an authenticated request was turned away.
#[derive(Debug)]
pub enum AuthRejection {
    /// No session at all: go to the sign-in page.
    RedirectToLogin,
    /// The stored session could not be refreshed.
    SessionExpired,
    /// The session layer is missing from the router.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => axum::response::Redirect::to("/auth/login").into_response(),
            Self::SessionExpired => Notice::SessionExpired
                .redirect("/auth/login")
                .into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::Unauthorized)?;

        let stored: AuthSession = session
            .get(session_keys::AUTH_SESSION)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection::RedirectToLogin)?;

        if !stored.is_expired(Utc::now()) {
            set_sentry_user(&stored.user_id);
            return Ok(Self(stored));
        }

        let user_id = stored.user_id;
        match state.sessions().ensure_fresh(stored).await {
            Ok(fresh) => {
                if let Err(e) = set_auth_session(&session, &fresh).await {
                    tracing::warn!(user_id = %user_id, error = %e, "Could not store refreshed session");
                }
                set_sentry_user(&fresh.user_id);
                Ok(Self(fresh))
            }
            Err(e) => {
                tracing::info!(user_id = %user_id, error = %e, "Session refresh refused; signing out");
                if let Err(e) = session.flush().await {
                    tracing::warn!(error = %e, "Could not clear browser session");
                }
                clear_sentry_user();
                Err(AuthRejection::SessionExpired)
            }
        }
    }
}

/// Extractor that reads the stored session without requiring one.
///
/// No refresh is attempted; pages using this only need to know whether
/// someone is signed in.
pub struct OptionalAuth(pub Option<AuthSession>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<AuthSession>(session_keys::AUTH_SESSION)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(auth))
    }
}

/// Store the backend session in the browser session.
///
/// The session id is cycled so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_auth_session(
    session: &Session,
    auth: &AuthSession,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::AUTH_SESSION, auth).await
}

/// Drop everything stored for this browser (sign-out).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_auth_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
