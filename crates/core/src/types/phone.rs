//! Phone number type.
//!
//! The identity provider signs customers in by phone, and the phone number is
//! the preferred key for their stored profile.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The number does not start with a `+` country prefix.
    #[error("phone number must start with + and a country code")]
    MissingCountryCode,
    /// The number contains something other than digits and separators.
    #[error("phone number may only contain digits")]
    InvalidCharacter,
    /// The digit count is outside the E.164 range.
    #[error("phone number must have between {min} and {max} digits")]
    InvalidLength {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count.
        max: usize,
    },
}

/// A phone number in E.164 form (`+919876543210`).
///
/// Spaces, dashes, dots and parentheses are accepted on input and stripped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Minimum digits after the `+`.
    pub const MIN_DIGITS: usize = 8;
    /// Maximum digits after the `+` (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Parse a phone number.
    ///
    /// # Errors
    ///
    /// Returns `PhoneError` if the input is empty, lacks the `+` prefix,
    /// contains letters, or has the wrong number of digits.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let rest = trimmed
            .strip_prefix('+')
            .ok_or(PhoneError::MissingCountryCode)?;

        let mut digits = String::with_capacity(rest.len());
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return Err(PhoneError::InvalidCharacter),
            }
        }

        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len()) {
            return Err(PhoneError::InvalidLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(format!("+{digits}")))
    }

    /// Returns the number as a string slice, including the `+`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_separators() {
        let phone = PhoneNumber::parse("+91 98765-43210").unwrap();
        assert_eq!(phone.as_str(), "+919876543210");

        let phone = PhoneNumber::parse("+1 (415) 555.0100").unwrap();
        assert_eq!(phone.as_str(), "+14155550100");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(PhoneNumber::parse(""), Err(PhoneError::Empty));
        assert_eq!(
            PhoneNumber::parse("9876543210"),
            Err(PhoneError::MissingCountryCode)
        );
        assert_eq!(
            PhoneNumber::parse("+91abc"),
            Err(PhoneError::InvalidCharacter)
        );
        assert!(matches!(
            PhoneNumber::parse("+1234"),
            Err(PhoneError::InvalidLength { .. })
        ));
        assert!(matches!(
            PhoneNumber::parse("+1234567890123456"),
            Err(PhoneError::InvalidLength { .. })
        ));
    }
}
