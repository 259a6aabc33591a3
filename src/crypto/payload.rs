//! Encrypted envelope
//!
//! The only form in which PHI payload content is ever persisted.

use crate::domain::KeyVersion;
use serde::{Deserialize, Serialize};

/// AES-GCM nonce length in bytes
pub const IV_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// One encrypted record
///
/// Binary fields serialize as base64 when the envelope is written as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// Ciphertext without the tag
    #[serde(with = "b64")]
    pub ciphertext: Vec<u8>,

    /// Fresh random nonce, never reused
    #[serde(with = "b64")]
    pub iv: Vec<u8>,

    /// AEAD authentication tag
    #[serde(with = "b64")]
    pub auth_tag: Vec<u8>,

    /// Version of the key that sealed this envelope
    pub key_version: KeyVersion,
}

mod b64 {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}
