//! Core types for Family Wishlist.
//!
//! This module provides type-safe wrappers for the domain concepts shared by
//! the web crate and its tests.

pub mod avatar;
pub mod id;
pub mod password;
pub mod price;
pub mod username;
pub mod wishlist;

pub use avatar::{AvatarUrl, AvatarUrlError};
pub use id::*;
pub use password::{Password, PasswordError};
pub use price::{CURRENCY_SYMBOL, Price, PriceError};
pub use username::{Username, UsernameError};
pub use wishlist::{ItemDetails, Profile, WishlistItem, sort_newest_first};
