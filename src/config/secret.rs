//! Secret configuration values
//!
//! Connection strings, encryption keys and the index pepper are held as
//! [`SecretString`]: zeroized on drop, redacted in `Debug`, and readable only
//! through an explicit `expose_secret()`.
//!
//! ```rust
//! use phigate::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let key = secret_string("AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=".to_string());
//! assert_eq!(key.expose_secret().len(), 44);
//! assert!(!format!("{key:?}").contains("AQEB"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl From<SecretValue> for String {
    fn from(mut s: SecretValue) -> Self {
        std::mem::take(&mut s.0)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl std::fmt::Display for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// Check if the secret value is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the secret value starts with a prefix
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// Borrow the secret as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the secret value contains a substring
    pub fn contains(&self, needle: &str) -> bool {
        self.0.contains(needle)
    }

    /// Raw bytes, for keyed hashing
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Parse the secret value into another type
    pub fn parse<F: std::str::FromStr>(&self) -> Result<F, F::Err> {
        self.0.parse()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Type alias for a secret string
///
/// This wraps a `SecretValue` in a `Secret` container that:
/// - Zeros the memory when dropped
/// - Prevents accidental logging via Debug
/// - Requires explicit `expose_secret()` to access
pub type SecretString = Secret<SecretValue>;

/// Wraps a plain string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("index-pepper".to_string());
        assert_eq!(secret.expose_secret(), "index-pepper");
        assert_eq!(secret.expose_secret().len(), 12);
        assert_eq!(secret.expose_secret().as_bytes(), b"index-pepper");
    }

    #[test]
    fn test_secret_str_access() {
        let secret = secret_string("postgresql://u:hunter2@db/phi".to_string());
        assert_eq!(secret.expose_secret().as_str(), "postgresql://u:hunter2@db/phi");
        assert!(secret.expose_secret().contains("hunter2"));
        assert!(!secret.expose_secret().contains("nope"));
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("postgresql://u:hunter2@db/phi".to_string());
        let debug_output = format!("{secret:?}");
        assert!(!debug_output.contains("hunter2"));
    }

    #[test]
    fn test_secret_toml_round_trip() {
        use serde::{Deserialize, Serialize};

        #[derive(Serialize, Deserialize)]
        struct Keys {
            v1: SecretString,
        }

        let keys: Keys = toml::from_str(r#"v1 = "c2VjcmV0""#).unwrap();
        assert_eq!(keys.v1.expose_secret(), "c2VjcmV0");

        let rendered = toml::to_string(&keys).unwrap();
        assert!(rendered.contains("c2VjcmV0"));
    }
}
