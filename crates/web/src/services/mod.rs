//! Business logic services.
//!
//! # Services
//!
//! - `identity` - Sign-up, sign-in and sign-out flows
//! - `session` - Per-user read models and session event handling
//! - `wishlist` - Item mutations with ownership and duplicate-submission checks

pub mod identity;
pub mod session;
pub mod wishlist;

pub use identity::{AuthError, IdentityFlow};
pub use session::{ReadModel, SessionController, Snapshot};
pub use wishlist::{CommandError, FormTarget, InFlightGuard, InFlightRegistry, WishlistCommands};
