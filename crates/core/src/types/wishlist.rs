//! Profile and wishlist item records.
//!
//! These are validated domain objects, separate from the backend's row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AvatarUrl, ItemId, Price, UserId, Username};

/// A family member as listed in the profile store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Identity id assigned by the backend at sign-up.
    pub id: UserId,
    /// Unique login name.
    pub username: Username,
    /// Optional profile picture.
    pub avatar_url: Option<AvatarUrl>,
}

/// A gift wish on someone's list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: ItemId,
    /// Owner; never changes after insert.
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    /// `None` means the wish has no price, not that it is free.
    pub price: Option<Price>,
    pub link: Option<String>,
    pub is_priority: bool,
    /// Assigned by the store at insert.
    pub created_at: DateTime<Utc>,
}

impl WishlistItem {
    /// Whether `user` may edit or delete this item.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }

    /// The mutable fields of this item.
    #[must_use]
    pub fn details(&self) -> ItemDetails {
        ItemDetails {
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price,
            link: self.link.clone(),
            is_priority: self.is_priority,
        }
    }
}

/// The user-editable part of a wishlist item.
///
/// Produced by a validated item form; used for both inserts and updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetails {
    /// Non-empty, trimmed.
    pub title: String,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub link: Option<String>,
    pub is_priority: bool,
}

/// Sort items newest first.
///
/// The sort is stable, so items with equal timestamps keep their store order.
pub fn sort_newest_first(items: &mut [WishlistItem]) {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn item(title: &str, minute: u32) -> WishlistItem {
        WishlistItem {
            id: ItemId::random(),
            owner_id: UserId::random(),
            title: title.to_string(),
            description: None,
            price: None,
            link: None,
            is_priority: false,
            created_at: Utc.with_ymd_and_hms(2024, 12, 1, 10, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_sort_newest_first() {
        let mut items = vec![item("old", 1), item("new", 30), item("mid", 15)];
        sort_newest_first(&mut items);
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["new", "mid", "old"]);
    }

    #[test]
    fn test_ownership() {
        let wish = item("bike", 0);
        assert!(wish.is_owned_by(wish.owner_id));
        assert!(!wish.is_owned_by(UserId::random()));
    }

    #[test]
    fn test_details_copies_mutable_fields() {
        let mut wish = item("bike", 0);
        wish.price = Some(Price::parse("120").unwrap());
        wish.is_priority = true;
        let details = wish.details();
        assert_eq!(details.title, "bike");
        assert_eq!(details.price, wish.price);
        assert!(details.is_priority);
    }
}
