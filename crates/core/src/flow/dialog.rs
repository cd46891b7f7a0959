//! Create/edit dialog state machine.
//!
//! ```text
//! Closed --open--> Open --submit--> Submitting --succeed--> Closed
//!                   ^  \                 |
//!                   |   `--invalid--'    |
//!                   `-------fail---------'
//! ```
//!
//! The form values travel with the state, so there is no way to be
//! submitting a dialog that is closed, or to lose input when a submission
//! fails.

use crate::error::ValidationError;
use crate::form::ItemForm;
use crate::types::{ItemDetails, WishlistItem};

/// Errors from an illegal dialog transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DialogError {
    /// Submit or close on a dialog that is not open.
    #[error("dialog is not open")]
    NotOpen,
    /// The dialog already has a submission in flight.
    #[error("submission already in progress")]
    Busy,
    /// The form did not validate; the dialog stays open.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// State of an item create or edit dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ItemDialog {
    #[default]
    Closed,
    Open(ItemForm),
    Submitting(ItemForm),
}

impl ItemDialog {
    /// A create dialog with empty defaults.
    #[must_use]
    pub fn create() -> Self {
        Self::Open(ItemForm::default())
    }

    /// An edit dialog pre-populated from `item`.
    #[must_use]
    pub fn edit(item: &WishlistItem) -> Self {
        Self::Open(ItemForm::from_item(item))
    }

    /// A dialog re-opened with values the user already typed.
    #[must_use]
    pub const fn with_values(form: ItemForm) -> Self {
        Self::Open(form)
    }

    /// Current form values, if the dialog is visible.
    #[must_use]
    pub const fn form(&self) -> Option<&ItemForm> {
        match self {
            Self::Closed => None,
            Self::Open(form) | Self::Submitting(form) => Some(form),
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting(_))
    }

    /// Validate and move to `Submitting`.
    ///
    /// # Errors
    ///
    /// - [`DialogError::NotOpen`] when closed
    /// - [`DialogError::Busy`] when already submitting
    /// - [`DialogError::Invalid`] when validation fails (state stays `Open`)
    pub fn submit(&mut self) -> Result<ItemDetails, DialogError> {
        match self {
            Self::Closed => Err(DialogError::NotOpen),
            Self::Submitting(_) => Err(DialogError::Busy),
            Self::Open(form) => {
                let details = form.validate()?;
                let form = std::mem::take(form);
                *self = Self::Submitting(form);
                Ok(details)
            }
        }
    }

    /// The backend accepted the submission: close and reset.
    pub fn succeed(&mut self) {
        if self.is_submitting() {
            *self = Self::Closed;
        }
    }

    /// The backend rejected the submission: reopen with values intact.
    pub fn fail(&mut self) {
        if let Self::Submitting(form) = self {
            let form = std::mem::take(form);
            *self = Self::Open(form);
        }
    }

    /// Close the dialog without submitting.
    ///
    /// # Errors
    ///
    /// Returns [`DialogError::Busy`] while a submission is in flight.
    pub fn close(&mut self) -> Result<(), DialogError> {
        if self.is_submitting() {
            return Err(DialogError::Busy);
        }
        *self = Self::Closed;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled(title: &str) -> ItemDialog {
        ItemDialog::with_values(ItemForm {
            title: title.to_string(),
            price: "12".to_string(),
            ..ItemForm::default()
        })
    }

    #[test]
    fn test_submit_from_closed_is_rejected() {
        let mut dialog = ItemDialog::Closed;
        assert_eq!(dialog.submit(), Err(DialogError::NotOpen));
    }

    #[test]
    fn test_double_submit_is_busy() {
        let mut dialog = filled("Bike");
        assert!(dialog.submit().is_ok());
        assert!(dialog.is_submitting());
        assert_eq!(dialog.submit(), Err(DialogError::Busy));
    }

    #[test]
    fn test_invalid_stays_open() {
        let mut dialog = filled("");
        assert_eq!(
            dialog.submit(),
            Err(DialogError::Invalid(ValidationError::MissingTitle))
        );
        assert!(dialog.is_open());
        assert!(!dialog.is_submitting());
    }

    #[test]
    fn test_success_closes_and_resets() {
        let mut dialog = filled("Bike");
        dialog.submit().unwrap();
        dialog.succeed();
        assert_eq!(dialog, ItemDialog::Closed);
        assert!(dialog.form().is_none());
    }

    #[test]
    fn test_failure_keeps_values() {
        let mut dialog = filled("Bike");
        dialog.submit().unwrap();
        dialog.fail();
        let form = dialog.form().unwrap();
        assert!(!dialog.is_submitting());
        assert_eq!(form.title, "Bike");
        assert_eq!(form.price, "12");
    }

    #[test]
    fn test_cannot_close_while_submitting() {
        let mut dialog = filled("Bike");
        dialog.submit().unwrap();
        assert_eq!(dialog.close(), Err(DialogError::Busy));
        dialog.fail();
        assert!(dialog.close().is_ok());
        assert!(!dialog.is_open());
    }
}
