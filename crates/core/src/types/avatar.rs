//! Avatar image URL type.

use core::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Image file extensions accepted for avatars (compared case-insensitively).
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];

/// Errors that can occur when parsing an [`AvatarUrl`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AvatarUrlError {
    /// The input is not an absolute URL.
    #[error("avatar must be a valid URL")]
    InvalidUrl,
    /// The URL does not end in a supported image extension.
    #[error("avatar URL must end in .jpg, .jpeg, .png or .webp")]
    NotAnImage,
}

/// Link to a profile picture.
///
/// The URL must parse and the raw input must end in one of `.jpg`, `.jpeg`,
/// `.png`, `.webp` (any case). The check runs on the input string, so a query
/// string after the extension is rejected.
///
/// ```
/// use family_wishlist_core::AvatarUrl;
///
/// assert!(AvatarUrl::parse("https://example.com/me.PNG").is_ok());
/// assert!(AvatarUrl::parse("https://example.com/me.gif").is_err());
/// assert!(AvatarUrl::parse("me.png").is_err());
///
/// // Empty input means "no avatar".
/// assert_eq!(AvatarUrl::parse_optional("").unwrap(), None);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct AvatarUrl(String);

impl AvatarUrl {
    /// Parse an avatar URL.
    ///
    /// # Errors
    ///
    /// Returns [`AvatarUrlError::InvalidUrl`] if the input is not an absolute
    /// URL and [`AvatarUrlError::NotAnImage`] if it lacks an image extension.
    pub fn parse(s: &str) -> Result<Self, AvatarUrlError> {
        Url::parse(s).map_err(|_| AvatarUrlError::InvalidUrl)?;

        let lower = s.to_ascii_lowercase();
        if !IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            return Err(AvatarUrlError::NotAnImage);
        }

        Ok(Self(s.to_owned()))
    }

    /// Parse an optional avatar URL where the empty string means "none".
    ///
    /// Any other input, including whitespace, is validated as-is.
    ///
    /// # Errors
    ///
    /// Same as [`Self::parse`] for non-empty input.
    pub fn parse_optional(s: &str) -> Result<Option<Self>, AvatarUrlError> {
        if s.is_empty() {
            return Ok(None);
        }
        Self::parse(s).map(Some)
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AvatarUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
