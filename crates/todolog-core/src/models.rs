//! Data models for todolog
//!
//! Defines the persisted item record and its opaque identifier.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A todo item
///
/// Items carry no identity of their own; the store refers to them by [`Id`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// What needs to be done
    #[serde(rename = "Text")]
    pub text: String,
    /// Whether it has been done
    #[serde(rename = "Done")]
    pub done: bool,
}

impl Item {
    /// Create a new, not yet done item
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }

    /// Return a copy with the done flag set to `done`
    pub fn with_done(&self, done: bool) -> Self {
        Self {
            text: self.text.clone(),
            done,
        }
    }

    /// Return a copy with the text replaced
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: self.done,
        }
    }
}

/// Opaque item identifier
///
/// Fresh IDs are 128 random bits from the operating system's secure
/// generator, hex-encoded. Collisions are not checked for.
///
/// IDs read back from the log are taken as-is; only [`Id::parse`] validates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

/// Errors from parsing a user-supplied ID
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid item ID '{0}': expected 32 hex characters")]
    Invalid(String),
}

impl Id {
    /// Generate a new random ID
    pub fn random() -> Self {
        let mut bytes = [0u8; 16];
        OsRng.fill_bytes(&mut bytes);
        Self::from_bytes(bytes)
    }

    /// Build an ID from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes).simple().to_string())
    }

    /// Parse a full ID (32 hex chars, or hyphenated UUID form)
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let uuid = Uuid::try_parse(s.trim()).map_err(|_| IdError::Invalid(s.to_string()))?;
        Ok(Self(uuid.simple().to_string()))
    }

    /// The hex string form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_id_is_32_hex_chars() {
        let id = Id::random();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert!(id.as_str().chars().all(|c| !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(Id::random(), Id::random());
    }

    #[test]
    fn test_from_bytes_keeps_all_bits() {
        let id = Id::from_bytes([0xff; 16]);
        assert_eq!(id.as_str(), "ffffffffffffffffffffffffffffffff");
    }

    #[test]
    fn test_parse() {
        let id = Id::parse("0123456789ABCDEF0123456789abcdef").unwrap();
        assert_eq!(id.as_str(), "0123456789abcdef0123456789abcdef");

        let hyphenated = Id::parse("01234567-89ab-cdef-0123-456789abcdef").unwrap();
        assert_eq!(hyphenated, id);

        assert!(matches!(Id::parse("xyz"), Err(IdError::Invalid(_))));
        assert!(Id::parse("").is_err());
    }

    #[test]
    fn test_short() {
        let id = Id::from("0123456789abcdef0123456789abcdef");
        assert_eq!(id.short(), "01234567");
        assert_eq!(Id::from("abc").short(), "abc");
    }

    #[test]
    fn test_item_serialization_field_names() {
        let item = Item {
            text: "buy milk".to_string(),
            done: true,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(json, r#"{"Text":"buy milk","Done":true}"#);

        let back: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_item_helpers() {
        let item = Item::new("write report");
        assert!(!item.done);
        let done = item.with_done(true);
        assert!(done.done);
        assert_eq!(done.text, "write report");
        let renamed = done.with_text("write summary");
        assert!(renamed.done);
        assert_eq!(renamed.text, "write summary");
    }
}
