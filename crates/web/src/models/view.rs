//! Template-facing projections of domain values.
//!
//! Templates only deal with strings and booleans; formatting (prices, avatar
//! fallbacks, owner labels) happens here.

use family_wishlist_core::{ItemCard, ItemForm, Profile, UserId};

/// Header navigation for signed-in pages.
#[derive(Debug, Clone)]
pub struct NavView {
    /// Empty when the viewer has no profile row.
    pub username: String,
    pub my_list_href: String,
}

impl NavView {
    #[must_use]
    pub fn new(viewer: UserId, profiles: &[Profile]) -> Self {
        let username = profiles
            .iter()
            .find(|p| p.id == viewer)
            .map(|p| p.username.to_string())
            .unwrap_or_default();
        Self {
            username,
            my_list_href: format!("/wishlists?user={viewer}"),
        }
    }
}

/// A family member as shown on the dashboard and in list headers.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    /// Fallback shown when there is no avatar.
    pub initial: char,
    pub list_href: String,
}

impl From<&Profile> for ProfileView {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id.to_string(),
            username: profile.username.to_string(),
            avatar_url: profile.avatar_url.as_ref().map(ToString::to_string),
            initial: profile.username.initial(),
            list_href: format!("/wishlists?user={}", profile.id),
        }
    }
}

/// One wish card.
#[derive(Debug, Clone)]
pub struct CardView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// `€9.00`; absent when the item has no price.
    pub price: Option<String>,
    pub link: Option<String>,
    pub is_priority: bool,
    pub owner: Option<ProfileView>,
    pub owner_label: Option<String>,
    pub owner_id: String,
    pub can_edit: bool,
}

impl From<&ItemCard> for CardView {
    fn from(card: &ItemCard) -> Self {
        Self {
            id: card.item.id.to_string(),
            title: card.item.title.clone(),
            description: card.item.description.clone(),
            price: card.price_label(),
            link: card.item.link.clone(),
            is_priority: card.item.is_priority,
            owner: card.owner.as_ref().map(ProfileView::from),
            owner_label: card.owner_label(),
            owner_id: card.item.owner_id.to_string(),
            can_edit: card.can_edit,
        }
    }
}

/// Values and target of the create/edit form.
#[derive(Debug, Clone)]
pub struct FormView {
    pub heading: &'static str,
    pub submit_label: &'static str,
    /// Where the form posts to.
    pub action: String,
    /// Where "Cancel" leads.
    pub cancel_href: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub link: String,
    pub is_priority: bool,
}

impl FormView {
    #[must_use]
    pub fn create(form: &ItemForm, cancel_href: String) -> Self {
        Self::with_values(form, "Add a wish", "Add wish", "/items".to_string(), cancel_href)
    }

    #[must_use]
    pub fn edit(form: &ItemForm, action: String) -> Self {
        let cancel_href = action.clone();
        Self::with_values(form, "Edit wish", "Save changes", action, cancel_href)
    }

    fn with_values(
        form: &ItemForm,
        heading: &'static str,
        submit_label: &'static str,
        action: String,
        cancel_href: String,
    ) -> Self {
        Self {
            heading,
            submit_label,
            action,
            cancel_href,
            title: form.title.clone(),
            description: form.description.clone(),
            price: form.price.clone(),
            link: form.link.clone(),
            is_priority: form.is_priority,
        }
    }
}
