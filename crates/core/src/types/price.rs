//! Wish price using decimal arithmetic.
//!
//! Prices are entered as free text in the item form. An empty field means the
//! wish has no price at all, which is different from a price of zero.

use core::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Currency symbol shown in front of every price.
pub const CURRENCY_SYMBOL: &str = "€";

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price must be a number")]
    NotANumber,
    /// The input is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative price in euros.
///
/// The amount is stored exactly as entered; rounding to two decimals only
/// happens when the price is displayed.
///
/// ```
/// use family_wishlist_core::Price;
///
/// let price = Price::parse("9").unwrap();
/// assert_eq!(price.to_string(), "€9.00");
///
/// assert_eq!(Price::parse_optional("").unwrap(), None);
/// assert!(Price::parse("-1").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Wrap a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_zero() {
            // "-0" parses with the sign bit set.
            return Ok(Self(Decimal::ZERO));
        }
        if amount.is_sign_negative() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Parse a price from form input.
    ///
    /// Accepts `.` or a single `,` as decimal separator and ignores
    /// surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotANumber`] for non-numeric input and
    /// [`PriceError::Negative`] for amounts below zero.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let normalized = s.trim().replacen(',', ".", 1);
        let amount = Decimal::from_str(&normalized).map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// Parse an optional price where blank input means "no price".
    ///
    /// # Errors
    ///
    /// Same as [`Self::parse`] for non-blank input.
    pub fn parse_optional(s: &str) -> Result<Option<Self>, PriceError> {
        if s.trim().is_empty() {
            return Ok(None);
        }
        Self::parse(s).map(Some)
    }

    /// The stored amount, unrounded.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Amount rounded and padded to exactly two decimals, without symbol.
    ///
    /// Half cents round away from zero.
    #[must_use]
    pub fn two_decimals(&self) -> String {
        let mut rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        rounded.to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CURRENCY_SYMBOL}{}", self.two_decimals())
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_always_has_two_decimals() {
        assert_eq!(Price::parse("9").unwrap().to_string(), "€9.00");
        assert_eq!(Price::parse("9.5").unwrap().to_string(), "€9.50");
        assert_eq!(Price::parse("19.99").unwrap().to_string(), "€19.99");
        assert_eq!(Price::parse("0").unwrap().to_string(), "€0.00");
    }

    #[test]
    fn test_display_rounds_extra_precision() {
        assert_eq!(Price::parse("2.499").unwrap().to_string(), "€2.50");
    }

    #[test]
    fn test_display_rounds_half_cents_up() {
        assert_eq!(Price::parse("2.125").unwrap().to_string(), "€2.13");
        assert_eq!(Price::parse("0.625").unwrap().to_string(), "€0.63");
        assert_eq!(Price::parse("0.005").unwrap().to_string(), "€0.01");
    }

    #[test]
    fn test_negative_zero_is_plain_zero() {
        for input in ["-0", "-0,00", " -0.0 "] {
            let price = Price::parse(input).unwrap();
            assert_eq!(price.to_string(), "€0.00");
            assert_eq!(price, Price::parse("0").unwrap());
            assert!(!price.amount().is_sign_negative());
        }
    }

    #[test]
    fn test_amount_is_stored_verbatim() {
        let price = Price::parse("2.499").unwrap();
        assert_eq!(price.amount().to_string(), "2.499");
    }

    #[test]
    fn test_comma_separator() {
        assert_eq!(Price::parse("12,5").unwrap().to_string(), "€12.50");
    }

    #[test]
    fn test_blank_is_absent_not_zero() {
        assert_eq!(Price::parse_optional("").unwrap(), None);
        assert_eq!(Price::parse_optional("  ").unwrap(), None);
        assert_eq!(
            Price::parse_optional("0").unwrap(),
            Some(Price::parse("0").unwrap())
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(Price::parse("abc"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("-0.01"), Err(PriceError::Negative));
    }
}
