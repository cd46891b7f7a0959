//! Read-side view models: dashboard, list filtering, item cards.
//!
//! Everything here is computed from a snapshot of profiles and items plus
//! the id of the viewing user. Affordances (create, edit, delete) are decided
//! here so templates only have to check booleans.

use serde::{Deserialize, Serialize};

use crate::types::{Profile, UserId, WishlistItem, sort_newest_first};

/// Which items a list view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListFilter {
    /// Every item from every family member.
    All,
    /// Only items owned by this user.
    User(UserId),
}

impl ListFilter {
    /// `None` selects everyone.
    #[must_use]
    pub const fn from_selection(user: Option<UserId>) -> Self {
        match user {
            Some(id) => Self::User(id),
            None => Self::All,
        }
    }

    #[must_use]
    pub fn matches(&self, item: &WishlistItem) -> bool {
        match self {
            Self::All => true,
            Self::User(id) => item.owner_id == *id,
        }
    }
}

/// Wording for an empty list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyMessage {
    /// The viewer's own list is empty.
    OwnList,
    /// Someone else's list is empty.
    OtherList,
    /// Nobody in the family has any wishes.
    AllLists,
}

impl EmptyMessage {
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::OwnList => "You haven't added any wishes yet",
            Self::OtherList => "This person hasn't added any wishes yet",
            Self::AllLists => "Nobody has added any wishes yet",
        }
    }
}

/// One item as rendered in a list or detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCard {
    pub item: WishlistItem,
    /// Owner profile, if it is known.
    pub owner: Option<Profile>,
    /// Edit and delete are offered.
    pub can_edit: bool,
}

impl ItemCard {
    /// Price line, or `None` when the item has no price.
    #[must_use]
    pub fn price_label(&self) -> Option<String> {
        self.item.price.map(|p| p.to_string())
    }

    /// "alice's wish", or `None` when the owner is unknown.
    #[must_use]
    pub fn owner_label(&self) -> Option<String> {
        self.owner
            .as_ref()
            .map(|p| format!("{}'s wish", p.username))
    }
}

/// Filtered, sorted list of item cards for one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub filter: ListFilter,
    pub viewer: UserId,
    pub cards: Vec<ItemCard>,
}

impl ListView {
    /// Build the view for `viewer` from a snapshot.
    ///
    /// Items are re-sorted newest first regardless of the order they arrive
    /// in. Edit/delete are only active in the viewer's own list.
    #[must_use]
    pub fn build(
        viewer: UserId,
        filter: ListFilter,
        profiles: &[Profile],
        items: &[WishlistItem],
    ) -> Self {
        let mut selected: Vec<WishlistItem> =
            items.iter().filter(|i| filter.matches(i)).cloned().collect();
        sort_newest_first(&mut selected);

        let own_list = filter == ListFilter::User(viewer);
        let cards = selected
            .into_iter()
            .map(|item| {
                let owner = profiles.iter().find(|p| p.id == item.owner_id).cloned();
                let can_edit = own_list && item.is_owned_by(viewer);
                ItemCard {
                    item,
                    owner,
                    can_edit,
                }
            })
            .collect();

        Self {
            filter,
            viewer,
            cards,
        }
    }

    /// "My wishlist": the only mode with a create affordance.
    #[must_use]
    pub fn is_own_list(&self) -> bool {
        self.filter == ListFilter::User(self.viewer)
    }

    #[must_use]
    pub fn can_create(&self) -> bool {
        self.is_own_list()
    }

    /// Message to show instead of cards, if there are none.
    #[must_use]
    pub fn empty_message(&self) -> Option<EmptyMessage> {
        if !self.cards.is_empty() {
            return None;
        }
        Some(match self.filter {
            ListFilter::All => EmptyMessage::AllLists,
            ListFilter::User(id) if id == self.viewer => EmptyMessage::OwnList,
            ListFilter::User(_) => EmptyMessage::OtherList,
        })
    }
}

/// Landing page after sign-in: the viewer and everybody else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    /// The viewer's own profile, if the profile row exists.
    pub me: Option<Profile>,
    /// Every other family member, in store order.
    pub family: Vec<Profile>,
}

impl Dashboard {
    #[must_use]
    pub fn build(viewer: UserId, profiles: &[Profile]) -> Self {
        let me = profiles.iter().find(|p| p.id == viewer).cloned();
        let family = profiles.iter().filter(|p| p.id != viewer).cloned().collect();
        Self { me, family }
    }
}
