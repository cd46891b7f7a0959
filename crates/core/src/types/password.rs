//! Password type.

use core::fmt;

/// Errors that can occur when accepting a [`Password`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// No password was entered.
    #[error("password is required")]
    Empty,
    /// The password is shorter than the sign-up minimum.
    #[error("password must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
}

/// A plaintext password on its way to the identity service.
///
/// The length rule only applies to new accounts: existing accounts may have
/// been created under a different rule, so sign-in accepts any non-empty value.
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Minimum length required when creating an account.
    pub const MIN_SIGN_UP_LENGTH: usize = 6;

    /// Accept a password for sign-in.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordError::Empty`] if the input is empty.
    pub fn for_sign_in(s: &str) -> Result<Self, PasswordError> {
        if s.is_empty() {
            return Err(PasswordError::Empty);
        }
        Ok(Self(s.to_owned()))
    }

    /// Accept a password for a new account.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordError::Empty`] if the input is empty and
    /// [`PasswordError::TooShort`] if it has fewer than
    /// [`Self::MIN_SIGN_UP_LENGTH`] characters.
    pub fn for_sign_up(s: &str) -> Result<Self, PasswordError> {
        if s.is_empty() {
            return Err(PasswordError::Empty);
        }
        if s.chars().count() < Self::MIN_SIGN_UP_LENGTH {
            return Err(PasswordError::TooShort {
                min: Self::MIN_SIGN_UP_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Expose the plaintext. Only the identity adapter should call this.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_accepts_short_passwords() {
        assert!(Password::for_sign_in("abc").is_ok());
        assert_eq!(Password::for_sign_in(""), Err(PasswordError::Empty));
    }

    #[test]
    fn test_sign_up_enforces_minimum() {
        assert_eq!(
            Password::for_sign_up("12345"),
            Err(PasswordError::TooShort { min: 6 })
        );
        assert!(Password::for_sign_up("secret1").is_ok());
        assert_eq!(Password::for_sign_up(""), Err(PasswordError::Empty));
    }

    #[test]
    fn test_debug_redacts() {
        let password = Password::for_sign_in("hunter22").unwrap();
        let debug = format!("{password:?}");
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("REDACTED"));
    }
}
