//! Key material and key resolution
//!
//! The engine never embeds keys. It asks a [`KeyResolver`] for the material
//! behind a [`KeyVersion`], which lets old envelopes stay readable after the
//! current version rotates.

use crate::config::schema::EncryptionConfig;
use crate::domain::{KeyVersion, PhiGateError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-256 key length in bytes
pub const KEY_LEN: usize = 32;

/// 256-bit symmetric key, zeroized on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial([u8; KEY_LEN]);

impl KeyMaterial {
    /// Wraps raw key bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> std::result::Result<Self, String> {
        let key: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| format!("expected {KEY_LEN} key bytes, got {}", bytes.len()))?;
        Ok(Self(key))
    }

    /// Decodes a base64 key
    pub fn from_base64(encoded: &str) -> std::result::Result<Self, String> {
        let mut raw = BASE64
            .decode(encoded.trim())
            .map_err(|e| format!("invalid base64 key: {e}"))?;
        let key = Self::from_slice(&raw);
        raw.zeroize();
        key
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial([REDACTED])")
    }
}

/// Resolves key versions to key material
///
/// Implementations front a KMS, HSM or static configuration. Resolution is
/// synchronous; anything remote should be cached by the implementation.
pub trait KeyResolver: Send + Sync {
    /// Material for a version, `None` if unknown
    fn resolve(&self, version: &KeyVersion) -> Option<KeyMaterial>;

    /// Version used for new writes
    fn current_version(&self) -> &KeyVersion;
}

/// Key resolver over an in-memory key table
pub struct StaticKeyResolver {
    keys: HashMap<KeyVersion, KeyMaterial>,
    current: KeyVersion,
}

impl StaticKeyResolver {
    /// Creates a resolver from a key table
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the current version is not in the table.
    pub fn new(current: KeyVersion, keys: HashMap<KeyVersion, KeyMaterial>) -> Result<Self> {
        if !keys.contains_key(&current) {
            return Err(PhiGateError::Configuration(format!(
                "Current key version '{current}' has no key material"
            )));
        }
        Ok(Self { keys, current })
    }

    /// Builds the resolver from the `[encryption]` section
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a bad version label or key encoding.
    pub fn from_config(config: &EncryptionConfig) -> Result<Self> {
        let current =
            KeyVersion::new(config.current_key_version.clone()).map_err(PhiGateError::Configuration)?;

        let mut keys = HashMap::with_capacity(config.keys.len());
        for (version, secret) in &config.keys {
            let version = KeyVersion::new(version.clone()).map_err(PhiGateError::Configuration)?;
            let material = KeyMaterial::from_base64(secret.expose_secret().as_ref()).map_err(|e| {
                PhiGateError::Configuration(format!("encryption.keys.{version}: {e}"))
            })?;
            keys.insert(version, material);
        }

        tracing::debug!(
            current_key_version = %current,
            key_versions = keys.len(),
            "Loaded encryption key table"
        );

        Self::new(current, keys)
    }

    /// Number of known key versions
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeyResolver for StaticKeyResolver {
    fn resolve(&self, version: &KeyVersion) -> Option<KeyMaterial> {
        self.keys.get(version).cloned()
    }

    fn current_version(&self) -> &KeyVersion {
        &self.current
    }
}
