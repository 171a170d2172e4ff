//! Transaction identifier handling
//!
//! Identifiers are opaque transaction hashes. This module provides:
//! - Format validation (rejecting malformed input before it is queued)
//! - Case normalization for storage in results
//! - Case-insensitive deduplication of input batches

mod normalize;

pub use normalize::{collect_identifiers, dedup_identifiers, CollectedIdentifiers};

use crate::IdentifierError;
use std::fmt;

/// Longest identifier accepted; real transaction hashes are far shorter
pub const MAX_IDENTIFIER_LEN: usize = 256;

/// A validated transaction identifier
///
/// Keeps the trimmed spelling it was created with, because the lookup
/// target may be case-sensitive. The lower-cased form is only used for
/// deduplication and for the `query_id` stored in results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Validates and wraps a raw identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use bridge_resolver::identifier::Identifier;
    ///
    /// let id = Identifier::parse("  0xABC123 ").unwrap();
    /// assert_eq!(id.as_str(), "0xABC123");
    /// assert_eq!(id.normalized(), "0xabc123");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }

        if trimmed.len() > MAX_IDENTIFIER_LEN {
            return Err(IdentifierError::TooLong(trimmed.len()));
        }

        if let Some(character) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(IdentifierError::InvalidCharacter {
                identifier: trimmed.to_string(),
                character,
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The identifier as it is sent to the lookup target
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The lower-cased form stored in results
    pub fn normalized(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
