//! Two-step deletion state machine.
//!
//! ```text
//! Idle --request--> ConfirmPending --confirm--> Idle (delete issued)
//!                         |
//!                         `------cancel-------> Idle (nothing issued)
//! ```
//!
//! `confirm` only yields an item id when the pending state names the same
//! item and carries the same nonce that was handed out by `request`, so a
//! delete can never be issued from a single click.

use serde::{Deserialize, Serialize};

use crate::types::ItemId;

/// Errors from confirming a deletion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeleteFlowError {
    /// Confirm without a prior delete request.
    #[error("no deletion is awaiting confirmation")]
    NothingPending,
    /// The confirmation names a different item or a stale nonce.
    #[error("confirmation does not match the pending deletion")]
    Mismatch,
}

/// Deletion state for one browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeleteFlow {
    #[default]
    Idle,
    ConfirmPending {
        item_id: ItemId,
        nonce: String,
    },
}

impl DeleteFlow {
    /// Ask for confirmation to delete `item_id`. Replaces any earlier request.
    #[must_use]
    pub fn request(item_id: ItemId, nonce: impl Into<String>) -> Self {
        Self::ConfirmPending {
            item_id,
            nonce: nonce.into(),
        }
    }

    /// Item awaiting confirmation, if any.
    #[must_use]
    pub const fn pending_item(&self) -> Option<ItemId> {
        match self {
            Self::Idle => None,
            Self::ConfirmPending { item_id, .. } => Some(*item_id),
        }
    }

    /// Confirm the pending deletion.
    ///
    /// Always returns the flow to `Idle`, whether or not the confirmation
    /// matched.
    ///
    /// # Errors
    ///
    /// - [`DeleteFlowError::NothingPending`] when idle
    /// - [`DeleteFlowError::Mismatch`] when the item or nonce differs
    pub fn confirm(&mut self, item_id: ItemId, nonce: &str) -> Result<ItemId, DeleteFlowError> {
        match std::mem::take(self) {
            Self::Idle => Err(DeleteFlowError::NothingPending),
            Self::ConfirmPending {
                item_id: pending,
                nonce: expected,
            } => {
                if pending == item_id && expected == nonce {
                    Ok(pending)
                } else {
                    Err(DeleteFlowError::Mismatch)
                }
            }
        }
    }

    /// Abandon the pending deletion.
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_without_request() {
        let mut flow = DeleteFlow::Idle;
        assert_eq!(
            flow.confirm(ItemId::random(), "n"),
            Err(DeleteFlowError::NothingPending)
        );
    }

    #[test]
    fn test_confirm_matching_request() {
        let item = ItemId::random();
        let mut flow = DeleteFlow::request(item, "abc");
        assert_eq!(flow.pending_item(), Some(item));
        assert_eq!(flow.confirm(item, "abc"), Ok(item));
        assert_eq!(flow, DeleteFlow::Idle);
    }

    #[test]
    fn test_mismatch_resets_to_idle() {
        let item = ItemId::random();
        let mut flow = DeleteFlow::request(item, "abc");
        assert_eq!(flow.confirm(item, "xyz"), Err(DeleteFlowError::Mismatch));
        assert_eq!(flow, DeleteFlow::Idle);

        let mut flow = DeleteFlow::request(item, "abc");
        assert_eq!(
            flow.confirm(ItemId::random(), "abc"),
            Err(DeleteFlowError::Mismatch)
        );
    }

    #[test]
    fn test_cancel() {
        let mut flow = DeleteFlow::request(ItemId::random(), "abc");
        flow.cancel();
        assert_eq!(flow.pending_item(), None);
    }

    #[test]
    fn test_serde_shape() {
        let flow = DeleteFlow::Idle;
        assert_eq!(
            serde_json::to_string(&flow).unwrap(),
            r#"{"state":"idle"}"#
        );
    }
}
