//! Wire types for the identity and row endpoints.
//!
//! Rows are converted into validated domain types at the edge; a row that
//! fails validation is reported as [`BackendError::DataCorruption`].

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use family_wishlist_core::{
    AvatarUrl, ItemDetails, ItemId, Price, Profile, UserId, Username, WishlistItem,
};

use crate::backend::{AuthSession, BackendError};

// =============================================================================
// Identity
// =============================================================================

#[derive(Debug, Serialize)]
pub struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignUpRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: UserMetadata<'a>,
}

/// Metadata stored on the identity at sign-up.
#[derive(Debug, Serialize)]
pub struct UserMetadata<'a> {
    pub username: &'a str,
    pub avatar_url: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
}

/// Token endpoint response.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

impl TokenResponse {
    pub fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        AuthSession::new(
            UserId::new(self.user.id),
            self.access_token,
            self.refresh_token,
            now + Duration::seconds(self.expires_in),
        )
    }
}

/// Sign-up answers with a session when auto-confirm is on, and with the bare
/// user otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(TokenResponse),
    User(UserResponse),
}

/// Error body returned by the identity endpoints.
///
/// Older deployments use `error`/`error_description`, newer ones `code`/`msg`.
#[derive(Debug, Default, Deserialize)]
pub struct AuthErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl AuthErrorBody {
    pub fn code(&self) -> Option<&str> {
        self.error_code.as_deref().or(self.error.as_deref())
    }

    pub fn message(&self) -> String {
        self.msg
            .as_deref()
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
            .unwrap_or("unknown error")
            .to_string()
    }
}

// =============================================================================
// Rows
// =============================================================================

/// `profiles` row as selected with `id,username,avatar_url`.
#[derive(Debug, Deserialize)]
pub struct ProfileRow {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = BackendError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username)
            .map_err(|e| BackendError::DataCorruption(format!("profile {}: {e}", row.id)))?;
        // Avatars are not re-validated: a bad link only breaks the image.
        let avatar_url = row
            .avatar_url
            .filter(|url| !url.trim().is_empty())
            .and_then(|url| AvatarUrl::parse(&url).ok());

        Ok(Self {
            id: UserId::new(row.id),
            username,
            avatar_url,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct NewProfileRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub avatar_url: Option<&'a str>,
}

impl<'a> From<&'a Profile> for NewProfileRow<'a> {
    fn from(profile: &'a Profile) -> Self {
        Self {
            id: profile.id.as_uuid(),
            username: profile.username.as_str(),
            avatar_url: profile.avatar_url.as_ref().map(AvatarUrl::as_str),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IdRow {
    #[allow(dead_code)]
    pub id: Uuid,
}

/// `wishlist_items` row.
#[derive(Debug, Deserialize)]
pub struct ItemRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub link: Option<String>,
    /// Nullable in the table; null reads as not a priority.
    #[serde(default)]
    pub is_priority: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for WishlistItem {
    type Error = BackendError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let price = row
            .price
            .map(Price::new)
            .transpose()
            .map_err(|e| BackendError::DataCorruption(format!("item {}: {e}", row.id)))?;

        Ok(Self {
            id: ItemId::new(row.id),
            owner_id: UserId::new(row.user_id),
            title: row.title,
            description: row.description.filter(|d| !d.is_empty()),
            price,
            link: row.link.filter(|l| !l.is_empty()),
            is_priority: row.is_priority.unwrap_or(false),
            created_at: row.created_at,
        })
    }
}

/// Mutable columns, shared by insert and update bodies.
#[derive(Debug, Serialize)]
pub struct ItemColumns<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub link: Option<&'a str>,
    pub is_priority: bool,
}

impl<'a> From<&'a ItemDetails> for ItemColumns<'a> {
    fn from(details: &'a ItemDetails) -> Self {
        Self {
            title: &details.title,
            description: details.description.as_deref(),
            price: details.price.map(|p| p.amount()),
            link: details.link.as_deref(),
            is_priority: details.is_priority,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewItemRow<'a> {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub columns: ItemColumns<'a>,
}
