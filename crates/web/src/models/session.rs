//! Session-related types.
//!
//! The browser session holds the backend-issued [`AuthSession`] and the
//! pending deletion, if any. Everything else is fetched per request.
//!
//! [`AuthSession`]: crate::backend::AuthSession

/// Session keys.
pub mod keys {
    /// Key for the signed-in user's backend session (tokens and user id).
    pub const AUTH_SESSION: &str = "auth_session";

    /// Key for the deletion awaiting confirmation.
    pub const DELETE_FLOW: &str = "delete_flow";
}
