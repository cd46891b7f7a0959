//! Explicit state machines for the item dialog and the deletion flow.

pub mod delete;
pub mod dialog;

pub use delete::{DeleteFlow, DeleteFlowError};
pub use dialog::{DialogError, ItemDialog};
