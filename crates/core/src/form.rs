//! Item create/edit form values.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ValidationError;
use crate::types::{ItemDetails, Price, WishlistItem};

/// Raw values of the item form, exactly as typed.
///
/// The form keeps strings so that a failed submission can be shown again
/// without losing what the user entered.
/// Missing fields deserialize to their defaults, so an unchecked priority
/// checkbox (absent from the submission) reads as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemForm {
    pub title: String,
    pub description: String,
    pub price: String,
    pub link: String,
    pub is_priority: bool,
}

impl ItemForm {
    /// Pre-populate the form from an existing item.
    #[must_use]
    pub fn from_item(item: &WishlistItem) -> Self {
        Self {
            title: item.title.clone(),
            description: item.description.clone().unwrap_or_default(),
            price: item
                .price
                .map(|p| p.amount().to_string())
                .unwrap_or_default(),
            link: item.link.clone().unwrap_or_default(),
            is_priority: item.is_priority,
        }
    }

    /// Validate the form into the item's mutable fields.
    ///
    /// Blank description and link become `None`; a blank price means the item
    /// has no price.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::MissingTitle`] if the title is blank
    /// - [`ValidationError::Price`] if the price is not a non-negative number
    /// - [`ValidationError::InvalidLink`] if the link is not an absolute URL
    pub fn validate(&self) -> Result<ItemDetails, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }

        let price = Price::parse_optional(&self.price)?;

        let link = non_blank(&self.link);
        if let Some(link) = &link {
            Url::parse(link).map_err(|_| ValidationError::InvalidLink)?;
        }

        Ok(ItemDetails {
            title: title.to_owned(),
            description: non_blank(&self.description),
            price,
            link,
            is_priority: self.is_priority,
        })
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
