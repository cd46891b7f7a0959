//! Authentication route handlers.
//!
//! Sign-in, sign-up and sign-out with username and password. Input is
//! validated before anything is sent to the backend; validation messages are
//! shown on the re-rendered form, backend outcomes travel as notices.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_auth_session, set_auth_session};
use crate::models::{Flash, MessageQuery, Notice};
use crate::services::AuthError;
use crate::state::AppState;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";

// =============================================================================
// Form Types
// =============================================================================

/// Sign-in form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Sign-up form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    /// Optional; an empty field means no avatar.
    #[serde(default)]
    pub avatar_url: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub flash: Flash,
    pub username: String,
}

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub flash: Flash,
    pub username: String,
    pub avatar_url: String,
}

// =============================================================================
// Sign-in
// =============================================================================

/// Display the sign-in page.
pub async fn login_page(
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if auth.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        flash: Flash::from_query(&query),
        username: String::new(),
    }
    .into_response()
}

/// Handle sign-in form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.identity().sign_in(&form.username, &form.password).await {
        Ok(auth) => {
            if let Err(e) = set_auth_session(&session, &auth).await {
                tracing::error!(error = %e, "Failed to store session");
                return Notice::Generic.redirect(LOGIN_PATH).into_response();
            }
            set_sentry_user(&auth.user_id);
            Redirect::to("/").into_response()
        }
        Err(AuthError::Validation(e)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            LoginTemplate {
                flash: Flash::error(e.to_string()),
                username: form.username,
            },
        )
            .into_response(),
        Err(AuthError::InvalidCredentials) => {
            Notice::InvalidCredentials.redirect(LOGIN_PATH).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in failed");
            Notice::Generic.redirect(LOGIN_PATH).into_response()
        }
    }
}

// =============================================================================
// Sign-up
// =============================================================================

/// Display the sign-up page.
pub async fn register_page(
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if auth.is_some() {
        return Redirect::to("/").into_response();
    }

    RegisterTemplate {
        flash: Flash::from_query(&query),
        username: String::new(),
        avatar_url: String::new(),
    }
    .into_response()
}

/// Handle sign-up form submission.
///
/// A backend that wants the address confirmed first returns no session; the
/// user is then sent to the sign-in page.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let outcome = state
        .identity()
        .sign_up(&form.username, &form.password, &form.avatar_url)
        .await;

    match outcome {
        Ok(outcome) => {
            let Some(auth) = outcome.session else {
                tracing::info!(user_id = %outcome.user_id, "Sign-up awaiting confirmation");
                return Notice::AccountPending.redirect(LOGIN_PATH).into_response();
            };
            if let Err(e) = set_auth_session(&session, &auth).await {
                tracing::error!(error = %e, "Failed to store session");
                return Notice::AccountPending.redirect(LOGIN_PATH).into_response();
            }
            set_sentry_user(&auth.user_id);
            Notice::AccountCreated.redirect("/").into_response()
        }
        Err(AuthError::Validation(e)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            RegisterTemplate {
                flash: Flash::error(e.to_string()),
                username: form.username,
                avatar_url: form.avatar_url,
            },
        )
            .into_response(),
        Err(AuthError::UsernameTaken) => (
            StatusCode::CONFLICT,
            RegisterTemplate {
                flash: Flash::from_notice(Some(Notice::UsernameTaken)),
                username: form.username,
                avatar_url: form.avatar_url,
            },
        )
            .into_response(),
        // Already logged at error level by the identity flow.
        Err(AuthError::ProfileNotCreated { .. }) => Notice::ProfileNotCreated
            .redirect(REGISTER_PATH)
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Sign-up failed");
            Notice::Generic.redirect(REGISTER_PATH).into_response()
        }
    }
}

// =============================================================================
// Sign-out
// =============================================================================

/// Handle sign-out.
///
/// The token is revoked at the identity service when possible; the browser
/// session is cleared regardless.
pub async fn logout(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    session: Session,
) -> Response {
    if let Some(auth) = auth {
        state.identity().sign_out(&auth).await;
    }

    if let Err(e) = clear_auth_session(&session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }
    clear_sentry_user();

    Notice::SignedOut.redirect(LOGIN_PATH).into_response()
}
