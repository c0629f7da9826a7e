//! Principal identities
//!
//! A principal is an opaque, comparable identity handed to the gate by
//! whoever authenticated the caller. The gate never inspects its structure
//! beyond rejecting null and malformed values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when a string cannot be used as a principal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Principal must not be empty")]
    Empty,
    #[error("Principal must not contain whitespace: {0:?}")]
    Whitespace(String),
    #[error("Null principal: {0}")]
    Null(String),
}

/// An authorized (or candidate) identity
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Parse a principal, rejecting empty, blank and null identities
    ///
    /// A null identity is the zero address: a string made only of `0`
    /// characters, with or without a `0x` prefix.
    pub fn parse(value: &str) -> Result<Self, IdentityError> {
        if value.is_empty() {
            return Err(IdentityError::Empty);
        }
        if value.chars().any(char::is_whitespace) {
            return Err(IdentityError::Whitespace(value.to_string()));
        }
        if Self::is_null(value) {
            return Err(IdentityError::Null(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    /// Wrap a value already known to be valid (e.g. a derived address)
    pub(crate) fn from_trusted(value: String) -> Self {
        debug_assert!(Self::parse(&value).is_ok());
        Self(value)
    }

    fn is_null(value: &str) -> bool {
        let digits = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .unwrap_or(value);
        digits.chars().all(|c| c == '0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Principal {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.0
    }
}

impl AsRef<str> for Principal {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
