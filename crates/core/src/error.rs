//! Client-side validation errors.
//!
//! A [`ValidationError`] always means the input was rejected before any call
//! to the backend was made.

use thiserror::Error;

use crate::types::{AvatarUrlError, PasswordError, PriceError, UsernameError};

/// Form input rejected before submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Username(#[from] UsernameError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    AvatarUrl(#[from] AvatarUrlError),

    #[error(transparent)]
    Price(#[from] PriceError),

    /// Item title missing or blank.
    #[error("title is required")]
    MissingTitle,

    /// Item link present but not a URL.
    #[error("link must be a valid URL")]
    InvalidLink,
}
