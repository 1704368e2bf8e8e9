//! # TransTrack Types
//!
//! Validated primitive types shared across the TransTrack crates.
//!
//! - [`NonEmptyText`] guarantees at least one non-whitespace character and is
//!   used for caller-supplied names and identifiers that must not be blank.
//! - [`EntityId`] is the canonical entity identifier (32 lowercase hex
//!   characters, no hyphens) used as the storage key for every stored record,
//!   and knows how to derive its sharded storage path.

use std::fmt;
use std::path::{Path, PathBuf};

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
}

/// Errors that can occur when parsing entity identifiers.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The input was not a canonical identifier
    #[error("entity id must be 32 lowercase hex characters without hyphens, got: '{0}'")]
    InvalidFormat(String),
}

/// A string type that guarantees non-empty content.
///
/// Wraps a `String` and ensures it contains at least one non-whitespace
/// character. Input is trimmed of leading and trailing whitespace during
/// construction, so the stored value never carries accidental padding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed before validation.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// TransTrack's canonical entity identifier.
///
/// A UUID rendered as 32 lowercase hex characters without hyphens. Every
/// stored record is keyed by one of these, and the storage layer derives the
/// record's sharded file path from it.
///
/// # Construction
///
/// - [`EntityId::generate`] allocates a fresh identifier (record creation).
/// - [`EntityId::parse`] validates an externally supplied identifier and
///   rejects anything that is not already canonical (hyphenated or uppercase
///   forms are not normalised).
///
/// # Display format
///
/// Always the canonical 32-character lowercase hex form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(uuid::Uuid);

impl EntityId {
    /// Allocates a fresh identifier (RFC 4122 version 4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be canonical.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidFormat`] unless `input` is exactly 32
    /// lowercase hex characters.
    pub fn parse(input: &str) -> Result<Self, IdError> {
        if !Self::is_canonical(input) {
            return Err(IdError::InvalidFormat(input.to_owned()));
        }
        let uuid = uuid::Uuid::parse_str(input)
            .map_err(|_| IdError::InvalidFormat(input.to_owned()))?;
        Ok(Self(uuid))
    }

    /// Returns true if `input` is in canonical form.
    ///
    /// Purely syntactic: exactly 32 bytes, all lowercase hex.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent/<s1>/<s2>/<id>.json`, the sharded document path for
    /// this identifier.
    ///
    /// `s1` is the first two hex characters, `s2` the next two. Sharding
    /// keeps directory fan-out bounded as collections grow.
    pub fn sharded_file(&self, parent: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent.join(s1).join(s2).join(format!("{canonical}.json"))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl std::str::FromStr for EntityId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EntityId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Jordan Reyes  ").unwrap();
        assert_eq!(text.as_str(), "Jordan Reyes");
    }

    #[test]
    fn non_empty_text_rejects_whitespace_only() {
        let err = NonEmptyText::new("   \t\n").expect_err("expected rejection");
        assert!(matches!(err, TextError::Empty));
    }

    #[test]
    fn non_empty_text_serialises_as_plain_string() {
        let text = NonEmptyText::new("MRN-1042").unwrap();
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"MRN-1042\"");
    }

    #[test]
    fn non_empty_text_deserialisation_rejects_blank() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }

    #[test]
    fn entity_id_generate_is_canonical() {
        let id = EntityId::generate();
        assert!(EntityId::is_canonical(&id.to_string()));
    }

    #[test]
    fn entity_id_parse_accepts_canonical() {
        let id = EntityId::parse("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
        assert_eq!(id.to_string(), "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    }

    #[test]
    fn entity_id_parse_rejects_hyphenated_and_uppercase() {
        assert!(EntityId::parse("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").is_err());
        assert!(EntityId::parse("aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa").is_err());
        assert!(EntityId::parse("abc").is_err());
    }

    #[test]
    fn entity_id_sharded_file_uses_two_level_prefix() {
        let id = EntityId::parse("ab12ab12ab12ab12ab12ab12ab12ab12").unwrap();
        let path = id.sharded_file(Path::new("/data/patients"));
        assert_eq!(
            path,
            Path::new("/data/patients/ab/12/ab12ab12ab12ab12ab12ab12ab12ab12.json")
        );
    }

    #[test]
    fn entity_id_round_trips_through_serde() {
        let id = EntityId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
