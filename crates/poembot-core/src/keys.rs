//! Row-key types for poem records.
//!
//! Poems are stored under dense, zero-based row keys of the form `poem<index>`,
//! with the index written as decimal ASCII and no zero padding.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix shared by every poem row key.
pub const POEM_KEY_PREFIX: &str = "poem";

/// Position of a poem within a written batch.
///
/// Parsing accepts either the bare index (`"12"`) or the full row key
/// (`"poem12"`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PoemIndex(u32);

impl PoemIndex {
    /// Create an index from its numeric value.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Return the numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Return the row key for this index, e.g. `poem42`.
    #[must_use]
    pub fn row_key(self) -> String {
        format!("{POEM_KEY_PREFIX}{}", self.0)
    }
}

impl From<u32> for PoemIndex {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl FromStr for PoemIndex {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix(POEM_KEY_PREFIX).unwrap_or(s);

        // u32::from_str accepts a leading '+', which is not a valid row key
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(KeyError::InvalidRowKey(s.to_string()));
        }

        digits
            .parse()
            .map(Self)
            .map_err(|_| KeyError::InvalidRowKey(s.to_string()))
    }
}

impl fmt::Debug for PoemIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoemIndex({})", self.0)
    }
}

impl fmt::Display for PoemIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.row_key())
    }
}

impl TryFrom<String> for PoemIndex {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PoemIndex> for String {
    fn from(index: PoemIndex) -> Self {
        index.row_key()
    }
}

/// Errors that can occur when parsing row keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The input is neither an index nor a `poem<index>` row key.
    #[error("invalid poem row key: {0:?}")]
    InvalidRowKey(String),
}
