//! Currency codes.
//!
//! Accounts hold a single currency for life. Codes are ISO-like: three ASCII
//! letters, stored upper case. The set is open (e.g. `KSH` is accepted), no
//! conversion between currencies ever happens.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned for a malformed currency code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid currency code '{0}': expected three letters")]
pub struct InvalidCurrency(pub String);

/// A validated, upper-case three-letter currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses and normalises a currency code.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCurrency` unless `code` is exactly three ASCII letters.
    pub fn parse(code: &str) -> Result<Self, InvalidCurrency> {
        let trimmed = code.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(InvalidCurrency(code.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrency;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = InvalidCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
