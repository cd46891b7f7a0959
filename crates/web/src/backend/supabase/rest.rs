//! Row endpoints (`/rest/v1`).

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use serde::de::DeserializeOwned;
use tracing::instrument;

use family_wishlist_core::{ItemDetails, ItemId, Profile, UserId, Username, WishlistItem};

use super::dto::{IdRow, ItemColumns, ItemRow, NewItemRow, NewProfileRow, ProfileRow};
use super::{SupabaseBackend, error_from_response};
use crate::backend::{AuthSession, BackendError, ProfileStore, WishlistStore};

const PROFILES_PATH: &str = "rest/v1/profiles";
const ITEMS_PATH: &str = "rest/v1/wishlist_items";

const PROFILE_COLUMNS: &str = "id,username,avatar_url";

/// Ask PostgREST to echo the affected rows.
const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";

impl SupabaseBackend {
    async fn read_rows<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: Option<&str>,
    ) -> Result<Vec<T>, BackendError> {
        let url = self.endpoint(path)?;
        let request = self.inner.client.get(url).query(query);
        let response = self.with_bearer(request, token).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, path).await);
        }

        Ok(response.json().await?)
    }
}

/// Run a domain conversion over every row, failing on the first bad one.
fn convert_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, BackendError>
where
    T: TryFrom<R, Error = BackendError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn id_filter(id: ItemId) -> String {
    format!("eq.{id}")
}

#[async_trait]
impl ProfileStore for SupabaseBackend {
    #[instrument(skip_all, fields(user_id = %session.user_id))]
    async fn list_profiles(&self, session: &AuthSession) -> Result<Vec<Profile>, BackendError> {
        let rows: Vec<ProfileRow> = self
            .read_rows(
                PROFILES_PATH,
                &[("select", PROFILE_COLUMNS)],
                Some(session.access_token()),
            )
            .await?;
        let profiles = convert_rows(rows)?;
        tracing::debug!(count = profiles.len(), "Fetched profiles");
        Ok(profiles)
    }

    #[instrument(skip_all, fields(username = %username))]
    async fn username_exists(&self, username: &Username) -> Result<bool, BackendError> {
        let filter = format!("eq.{username}");
        let rows: Vec<IdRow> = self
            .read_rows(
                PROFILES_PATH,
                &[("select", "id"), ("username", filter.as_str()), ("limit", "1")],
                None,
            )
            .await?;
        Ok(!rows.is_empty())
    }

    #[instrument(skip_all, fields(user_id = %profile.id))]
    async fn insert_profile(
        &self,
        session: Option<&AuthSession>,
        profile: &Profile,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(PROFILES_PATH)?;
        let request = self
            .inner
            .client
            .post(url)
            .header("Prefer", HeaderValue::from_static(RETURN_MINIMAL))
            .json(&[NewProfileRow::from(profile)]);
        let response = self
            .with_bearer(request, session.map(AuthSession::access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "insert profile").await);
        }

        tracing::info!("Profile created");
        Ok(())
    }
}

#[async_trait]
impl WishlistStore for SupabaseBackend {
    #[instrument(skip_all, fields(user_id = %session.user_id))]
    async fn list_items(&self, session: &AuthSession) -> Result<Vec<WishlistItem>, BackendError> {
        let rows: Vec<ItemRow> = self
            .read_rows(
                ITEMS_PATH,
                &[("select", "*"), ("order", "created_at.desc")],
                Some(session.access_token()),
            )
            .await?;
        let items = convert_rows(rows)?;
        tracing::debug!(count = items.len(), "Fetched wishlist items");
        Ok(items)
    }

    #[instrument(skip_all, fields(user_id = %owner))]
    async fn insert_item(
        &self,
        session: &AuthSession,
        owner: UserId,
        details: &ItemDetails,
    ) -> Result<WishlistItem, BackendError> {
        let body = [NewItemRow {
            user_id: owner.as_uuid(),
            columns: ItemColumns::from(details),
        }];

        let url = self.endpoint(ITEMS_PATH)?;
        let request = self
            .inner
            .client
            .post(url)
            .header("Prefer", HeaderValue::from_static(RETURN_REPRESENTATION))
            .json(&body);
        let response = self
            .with_bearer(request, Some(session.access_token()))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "insert item").await);
        }

        let rows: Vec<ItemRow> = response.json().await?;
        let row = rows.into_iter().next().ok_or_else(|| BackendError::Status {
            status: 0,
            message: "insert returned no row".to_string(),
        })?;
        let item = WishlistItem::try_from(row)?;
        tracing::info!(item_id = %item.id, "Wishlist item created");
        Ok(item)
    }

    #[instrument(skip_all, fields(item_id = %id))]
    async fn update_item(
        &self,
        session: &AuthSession,
        id: ItemId,
        details: &ItemDetails,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(ITEMS_PATH)?;
        let filter = id_filter(id);
        let request = self
            .inner
            .client
            .patch(url)
            .query(&[("id", filter.as_str())])
            .header("Prefer", HeaderValue::from_static(RETURN_REPRESENTATION))
            .json(&ItemColumns::from(details));
        let response = self
            .with_bearer(request, Some(session.access_token()))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "update item").await);
        }

        // Row policies hide other users' rows, so "not yours" reads as zero rows.
        let rows: Vec<IdRow> = response.json().await?;
        if rows.is_empty() {
            return Err(BackendError::NotFound(format!("wishlist item {id}")));
        }

        tracing::info!("Wishlist item updated");
        Ok(())
    }

    #[instrument(skip_all, fields(item_id = %id))]
    async fn delete_item(&self, session: &AuthSession, id: ItemId) -> Result<(), BackendError> {
        let url = self.endpoint(ITEMS_PATH)?;
        let filter = id_filter(id);
        let request = self
            .inner
            .client
            .delete(url)
            .query(&[("id", filter.as_str())])
            .header("Prefer", HeaderValue::from_static(RETURN_REPRESENTATION));
        let response = self
            .with_bearer(request, Some(session.access_token()))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "delete item").await);
        }

        let rows: Vec<IdRow> = response.json().await?;
        if rows.is_empty() {
            return Err(BackendError::NotFound(format!("wishlist item {id}")));
        }

        tracing::info!("Wishlist item deleted");
        Ok(())
    }
}
