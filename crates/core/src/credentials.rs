//! Sign-in and sign-up input validation.
//!
//! Both forms are validated completely before the identity service is
//! contacted. The checks run in the order the form reports errors:
//! username first, then avatar, then password.

use crate::error::ValidationError;
use crate::types::{AvatarUrl, Password, Username};

/// Validated sign-in credentials.
#[derive(Debug, Clone)]
pub struct SignIn {
    pub username: Username,
    pub password: Password,
}

impl SignIn {
    /// Validate raw sign-in form values.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the username is malformed or the
    /// password is empty.
    pub fn validate(username: &str, password: &str) -> Result<Self, ValidationError> {
        let username = Username::parse(username)?;
        let password = Password::for_sign_in(password)?;
        Ok(Self { username, password })
    }
}

/// Validated sign-up request.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub username: Username,
    pub password: Password,
    pub avatar_url: Option<AvatarUrl>,
}

impl SignUp {
    /// Validate raw sign-up form values. An empty avatar means "none".
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the username is malformed, the avatar
    /// URL is not an image link, or the password is shorter than
    /// [`Password::MIN_SIGN_UP_LENGTH`].
    pub fn validate(
        username: &str,
        password: &str,
        avatar_url: &str,
    ) -> Result<Self, ValidationError> {
        let username = Username::parse(username)?;
        let avatar_url = AvatarUrl::parse_optional(avatar_url)?;
        let password = Password::for_sign_up(password)?;
        Ok(Self {
            username,
            password,
            avatar_url,
        })
    }
}
