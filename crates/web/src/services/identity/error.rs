//! Identity flow error types.

use thiserror::Error;

use family_wishlist_core::{UserId, ValidationError};

use crate::backend::BackendError;

/// Errors that can occur while signing up, in or out.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Form input rejected before contacting the backend.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Wrong password or unknown username. Deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A profile with this username already exists.
    #[error("username already taken")]
    UsernameTaken,

    /// The identity was created but its profile row was not.
    ///
    /// The identity is left in place; `user_id` names it for manual cleanup.
    #[error("profile not created for identity {user_id}: {source}")]
    ProfileNotCreated {
        user_id: UserId,
        #[source]
        source: BackendError,
    },

    /// Backend call failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}
