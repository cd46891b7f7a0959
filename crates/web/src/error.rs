//! Unified error handling with Sentry integration.
//!
//! Most handlers turn expected failures into a redirect carrying a
//! [`Notice`]. `AppError` covers the rest: it captures server-side failures
//! to Sentry before responding and never shows internal details to the
//! client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::models::Notice;
use crate::services::{AuthError, CommandError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Identity flow failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Wishlist command failed.
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Browser session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The backend no longer accepts the stored session.
    #[error("Session expired")]
    SessionExpired,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Backend(_) | Self::Session(_) | Self::Internal(_) | Self::Command(CommandError::Backend(_))
        ) || matches!(self, Self::Auth(AuthError::Backend(_) | AuthError::ProfileNotCreated { .. }))
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Backend(_) | Self::Command(CommandError::Backend(_)) => StatusCode::BAD_GATEWAY,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UsernameTaken => StatusCode::CONFLICT,
                AuthError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AuthError::Backend(_) => StatusCode::BAD_GATEWAY,
                AuthError::ProfileNotCreated { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Command(err) => match err {
                CommandError::InFlight => StatusCode::CONFLICT,
                CommandError::NotOwner(_) => StatusCode::FORBIDDEN,
                CommandError::NotFound(_) => StatusCode::NOT_FOUND,
                CommandError::Backend(_) => StatusCode::BAD_GATEWAY,
            },
            Self::SessionExpired => StatusCode::SEE_OTHER,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Text shown to the user.
    fn public_message(&self) -> String {
        match self {
            Self::Backend(_) | Self::Session(_) | Self::Internal(_) => {
                Notice::Generic.text().to_string()
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => Notice::InvalidCredentials.text().to_string(),
                AuthError::UsernameTaken => Notice::UsernameTaken.text().to_string(),
                AuthError::Validation(e) => e.to_string(),
                AuthError::ProfileNotCreated { .. } => Notice::ProfileNotCreated.text().to_string(),
                AuthError::Backend(_) => Notice::Generic.text().to_string(),
            },
            Self::Command(err) => match err {
                CommandError::InFlight => Notice::InFlight.text().to_string(),
                CommandError::NotOwner(_) => Notice::NotOwner.text().to_string(),
                CommandError::NotFound(_) => Notice::NotFound.text().to_string(),
                CommandError::Backend(_) => Notice::Generic.text().to_string(),
            },
            Self::SessionExpired => Notice::SessionExpired.text().to_string(),
            Self::NotFound(_) => "Not found".to_string(),
            Self::BadRequest(_) => "Bad request".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::SessionExpired)
            || matches!(self, Self::Backend(BackendError::Unauthorized))
            || matches!(self, Self::Command(CommandError::Backend(BackendError::Unauthorized)))
        {
            return Notice::SessionExpired
                .redirect("/auth/login")
                .into_response();
        }

        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        (self.status(), self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Associate subsequent Sentry events with a user.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
