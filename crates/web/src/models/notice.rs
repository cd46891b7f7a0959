//! Transient notices shown after a redirect.
//!
//! Handlers redirect with `?success=<code>` or `?error=<code>`; the target
//! page maps the code back to fixed text. Unknown codes are ignored, so a
//! crafted URL can never inject text into a page.

use axum::response::Redirect;
use serde::Deserialize;

/// Query parameters for error/success display.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

impl MessageQuery {
    /// The notice named by the query, success taking precedence.
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        let success = self
            .success
            .as_deref()
            .and_then(Notice::from_code)
            .filter(|n| n.kind() == NoticeKind::Success);
        let error = self
            .error
            .as_deref()
            .and_then(Notice::from_code)
            .filter(|n| n.kind() == NoticeKind::Error);
        success.or(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Every notice the application can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    AccountCreated,
    AccountPending,
    SignedOut,
    ItemAdded,
    ItemUpdated,
    ItemDeleted,
    InvalidCredentials,
    UsernameTaken,
    ProfileNotCreated,
    SessionExpired,
    NotOwner,
    NotFound,
    InFlight,
    DeleteNotConfirmed,
    Generic,
}

impl Notice {
    const ALL: [Self; 15] = [
        Self::AccountCreated,
        Self::AccountPending,
        Self::SignedOut,
        Self::ItemAdded,
        Self::ItemUpdated,
        Self::ItemDeleted,
        Self::InvalidCredentials,
        Self::UsernameTaken,
        Self::ProfileNotCreated,
        Self::SessionExpired,
        Self::NotOwner,
        Self::NotFound,
        Self::InFlight,
        Self::DeleteNotConfirmed,
        Self::Generic,
    ];

    /// Code used in query strings.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::AccountCreated => "account_created",
            Self::AccountPending => "account_pending",
            Self::SignedOut => "signed_out",
            Self::ItemAdded => "item_added",
            Self::ItemUpdated => "item_updated",
            Self::ItemDeleted => "item_deleted",
            Self::InvalidCredentials => "credentials",
            Self::UsernameTaken => "username_taken",
            Self::ProfileNotCreated => "profile",
            Self::SessionExpired => "session_expired",
            Self::NotOwner => "not_owner",
            Self::NotFound => "not_found",
            Self::InFlight => "in_flight",
            Self::DeleteNotConfirmed => "delete_unconfirmed",
            Self::Generic => "generic",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.code() == code)
    }

    #[must_use]
    pub const fn kind(self) -> NoticeKind {
        match self {
            Self::AccountCreated
            | Self::AccountPending
            | Self::SignedOut
            | Self::ItemAdded
            | Self::ItemUpdated
            | Self::ItemDeleted => NoticeKind::Success,
            _ => NoticeKind::Error,
        }
    }

    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self.kind(), NoticeKind::Error)
    }

    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::AccountCreated => "Account created successfully!",
            Self::AccountPending => "Account created! Please sign in.",
            Self::SignedOut => "You have been signed out.",
            Self::ItemAdded => "Wish added successfully!",
            Self::ItemUpdated => "Wish updated successfully!",
            Self::ItemDeleted => "Wish deleted successfully!",
            Self::InvalidCredentials => "Invalid username or password",
            Self::UsernameTaken => "This username is already taken",
            Self::ProfileNotCreated => {
                "Your account was created but your profile could not be saved. Please ask for help."
            }
            Self::SessionExpired => "Your session has expired. Please sign in again.",
            Self::NotOwner => "You can only change your own wishes",
            Self::NotFound => "That wish no longer exists",
            Self::InFlight => "Your wish is already being saved",
            Self::DeleteNotConfirmed => "Please confirm the deletion first",
            Self::Generic => "Something went wrong. Please try again.",
        }
    }

    /// Redirect to `path` carrying this notice.
    #[must_use]
    pub fn redirect(self, path: &str) -> Redirect {
        let key = match self.kind() {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        };
        let separator = if path.contains('?') { '&' } else { '?' };
        Redirect::to(&format!("{path}{separator}{key}={}", self.code()))
    }
}

/// Messages rendered at the top of a page.
#[derive(Debug, Clone, Default)]
pub struct Flash {
    pub error: Option<String>,
    pub success: Option<String>,
}

impl Flash {
    /// Flash for a notice named in the query string.
    #[must_use]
    pub fn from_query(query: &MessageQuery) -> Self {
        Self::from_notice(query.notice())
    }

    #[must_use]
    pub fn from_notice(notice: Option<Notice>) -> Self {
        match notice {
            Some(n) if n.is_error() => Self::error(n.text()),
            Some(n) => Self {
                error: None,
                success: Some(n.text().to_string()),
            },
            None => Self::default(),
        }
    }

    /// An error message, sentence-cased.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        let text: String = text.into();
        let mut chars = text.chars();
        let text: String = chars
            .next()
            .map(|first| first.to_uppercase().chain(chars).collect())
            .unwrap_or_default();
        Self {
            error: Some(text),
            success: None,
        }
    }

    /// Keep this flash unless it is empty, then fall back to `notice`.
    #[must_use]
    pub fn or_notice(self, notice: Option<Notice>) -> Self {
        if self.error.is_some() || self.success.is_some() {
            self
        } else {
            Self::from_notice(notice)
        }
    }
}
