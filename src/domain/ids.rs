//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that cross the compliance boundary.
//! Each type validates its format on construction so that, for example, a
//! collection name can never smuggle SQL or path fragments into a store.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use uuid::Uuid;

fn collection_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9_]{0,62}$").unwrap_or_else(|_| unreachable!("static pattern"))
    })
}

/// Collection (table) name newtype wrapper
///
/// Lower-case snake_case, starting with a letter, at most 63 characters
/// (the PostgreSQL identifier limit).
///
/// # Examples
///
/// ```
/// use phigate::domain::ids::CollectionName;
/// use std::str::FromStr;
///
/// let name = CollectionName::from_str("menopause_symptoms").unwrap();
/// assert_eq!(name.as_str(), "menopause_symptoms");
///
/// assert!(CollectionName::from_str("users; DROP TABLE x").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionName(String);

impl CollectionName {
    /// Creates a new CollectionName from a string
    ///
    /// Surrounding whitespace is trimmed before validation.
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err("Collection name cannot be empty".to_string());
        }
        if !collection_pattern().is_match(trimmed) {
            return Err(format!(
                "Invalid collection name '{trimmed}'. Expected lower-case snake_case, max 63 chars"
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the collection name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CollectionName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CollectionName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CollectionName> for String {
    fn from(name: CollectionName) -> Self {
        name.0
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encryption key version label
///
/// Stored next to every envelope so old records stay decryptable after the
/// current key rotates.
///
/// # Examples
///
/// ```
/// use phigate::domain::ids::KeyVersion;
///
/// let version = KeyVersion::new("v2").unwrap();
/// assert_eq!(version.as_str(), "v2");
/// assert!(KeyVersion::new("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyVersion(String);

impl KeyVersion {
    /// Creates a new KeyVersion from a string
    pub fn new(version: impl Into<String>) -> Result<Self, String> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err("Key version cannot be empty".to_string());
        }
        if version.len() > 64 {
            return Err("Key version cannot exceed 64 characters".to_string());
        }
        Ok(Self(version))
    }

    /// Returns the key version as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for KeyVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for KeyVersion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KeyVersion> for String {
    fn from(version: KeyVersion) -> Self {
        version.0
    }
}

/// Record identifier newtype wrapper (UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generates a fresh random record id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| format!("Invalid record id '{s}': {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_name_valid() {
        let name = CollectionName::new("menopause_symptoms").unwrap();
        assert_eq!(name.as_str(), "menopause_symptoms");
        assert_eq!(name.to_string(), "menopause_symptoms");
    }

    #[test]
    fn test_collection_name_trims_whitespace() {
        let name = CollectionName::new("  usage_tracking ").unwrap();
        assert_eq!(name.as_str(), "usage_tracking");
    }

    #[test]
    fn test_collection_name_rejects_invalid() {
        assert!(CollectionName::new("").is_err());
        assert!(CollectionName::new("Upper").is_err());
        assert!(CollectionName::new("1starts_with_digit").is_err());
        assert!(CollectionName::new("has-dash").is_err());
        assert!(CollectionName::new("x'; DROP TABLE phi_records; --").is_err());
        assert!(CollectionName::new("a".repeat(64)).is_err());
    }

    #[test]
    fn test_collection_name_serde() {
        let name: CollectionName = serde_json::from_str("\"therapy_sessions\"").unwrap();
        assert_eq!(name.as_str(), "therapy_sessions");
        assert!(serde_json::from_str::<CollectionName>("\"Bad Name\"").is_err());
    }

    #[test]
    fn test_key_version() {
        assert!(KeyVersion::new("v1").is_ok());
        assert!(KeyVersion::new("").is_err());
        assert!(KeyVersion::new("x".repeat(65)).is_err());
    }

    #[test]
    fn test_record_id_roundtrip_display() {
        let id = RecordId::generate();
        let parsed = RecordId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(RecordId::from_str("not-a-uuid").is_err());
    }
}
