//! Family Wishlist Core - Shared types library.
//!
//! This crate provides the domain types and view logic used by the web
//! application and its integration tests.
//!
//! # Architecture
//!
//! The core crate contains only types, validation and state machines - no
//! I/O, no HTTP clients. Everything that talks to the backend lives in
//! `family-wishlist-web`.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, usernames, passwords, avatars, prices
//! - [`credentials`] - Sign-in / sign-up input validation
//! - [`form`] - Item form values and validation
//! - [`flow`] - Item dialog and deletion state machines
//! - [`view`] - Dashboard and list view models
//! - [`welcome`] - Overlay gates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod credentials;
pub mod error;
pub mod flow;
pub mod form;
pub mod types;
pub mod view;
pub mod welcome;

pub use credentials::{SignIn, SignUp};
pub use error::ValidationError;
pub use flow::{DeleteFlow, DeleteFlowError, DialogError, ItemDialog};
pub use form::ItemForm;
pub use types::*;
pub use view::{Dashboard, EmptyMessage, ItemCard, ListFilter, ListView};
