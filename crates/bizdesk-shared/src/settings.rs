use std::{fmt::Debug, fmt::Display, ops::Deref};

use secrecy::{ExposeSecret as _, SecretString};

use crate::errors::ConversionError;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ThemeName(String);

/// ISO 4217 style code, always stored upper case
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

/// Numeric PIN used to confirm destructive enterprise operations
#[derive(Clone)]
pub struct SecurityPin(SecretString);

/// Settings hydrated after authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSettings {
    pub theme: ThemeName,
    pub currency: CurrencyCode,
    pub has_security_pin: bool,
}

impl ThemeName {
    pub const MAX_LENGTH: usize = 32;
}

impl TryFrom<String> for ThemeName {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ConversionError::check_length(&value, Self::MAX_LENGTH)?;
        if let Some(found) = value
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(ConversionError::InvalidCharacter {
                found,
                expected: "lower case letters, digits or '-'",
            });
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for ThemeName {
    type Error = ConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.to_string().try_into()
    }
}

impl CurrencyCode {
    pub const LENGTH: usize = 3;
}

impl TryFrom<String> for CurrencyCode {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ConversionError::check_length(&value, Self::LENGTH)?;
        if value.len() < Self::LENGTH {
            return Err(ConversionError::MinNotMet {
                min: Self::LENGTH,
                actual: value.len(),
            });
        }
        if let Some(found) = value.chars().find(|c| !c.is_ascii_alphabetic()) {
            return Err(ConversionError::InvalidCharacter {
                found,
                expected: "letters",
            });
        }
        Ok(Self(value.to_ascii_uppercase()))
    }
}

impl TryFrom<&str> for CurrencyCode {
    type Error = ConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.to_string().try_into()
    }
}

impl SecurityPin {
    pub const MIN_LENGTH: usize = 4;
    pub const MAX_LENGTH: usize = 6;

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Compares two PIN entries without exposing them to the caller
    pub fn matches(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl TryFrom<SecretString> for SecurityPin {
    type Error = ConversionError;

    fn try_from(value: SecretString) -> Result<Self, Self::Error> {
        let digits = value.expose_secret();
        ConversionError::check_length(digits, Self::MAX_LENGTH)?;
        if digits.len() < Self::MIN_LENGTH {
            return Err(ConversionError::MinNotMet {
                min: Self::MIN_LENGTH,
                actual: digits.len(),
            });
        }
        if digits.chars().any(|c| !c.is_ascii_digit()) {
            // Do not echo the character back, it is part of a secret
            return Err(ConversionError::InvalidCharacter {
                found: '*',
                expected: "digits",
            });
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for SecurityPin {
    type Error = ConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        SecretString::from(value).try_into()
    }
}

impl Debug for SecurityPin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecurityPin(***)")
    }
}

impl From<ThemeName> for String {
    fn from(value: ThemeName) -> Self {
        value.0
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

impl Deref for ThemeName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0[..]
    }
}

impl Deref for CurrencyCode {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0[..]
    }
}

impl Display for ThemeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
