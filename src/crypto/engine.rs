//! Envelope encryption engine
//!
//! Whole-record AES-256-GCM: the record is serialized to JSON and sealed as a
//! single opaque envelope. Each call draws a fresh random IV from the OS RNG.
//! The key version is bound as associated data, so relabelling an envelope
//! with another version fails authentication instead of decrypting garbage.

use super::keys::KeyResolver;
use super::payload::{EncryptedPayload, IV_LEN, TAG_LEN};
use crate::domain::{DecryptionError, EncryptionError, KeyVersion};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Envelope encryption engine
pub struct EncryptionEngine {
    resolver: Arc<dyn KeyResolver>,
}

impl EncryptionEngine {
    /// Creates an engine over a key resolver
    pub fn new(resolver: Arc<dyn KeyResolver>) -> Self {
        Self { resolver }
    }

    /// Key version used for new writes
    pub fn current_key_version(&self) -> &KeyVersion {
        self.resolver.current_version()
    }

    /// Encrypts a record under the current key version
    pub fn encrypt_current<T: Serialize + ?Sized>(
        &self,
        record: &T,
    ) -> Result<EncryptedPayload, EncryptionError> {
        let version = self.resolver.current_version().clone();
        self.encrypt(record, &version)
    }

    /// Encrypts a record under a specific key version
    ///
    /// # Errors
    ///
    /// Fails if the record cannot be serialized, the version is unknown or
    /// the cipher rejects the input. No partial envelope is ever returned.
    pub fn encrypt<T: Serialize + ?Sized>(
        &self,
        record: &T,
        key_version: &KeyVersion,
    ) -> Result<EncryptedPayload, EncryptionError> {
        let key = self
            .resolver
            .resolve(key_version)
            .ok_or_else(|| EncryptionError::UnknownKeyVersion(key_version.to_string()))?;

        let plaintext = Zeroizing::new(
            serde_json::to_vec(record).map_err(|e| EncryptionError::Serialization(e.to_string()))?,
        );

        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| EncryptionError::InvalidKey(key_version.to_string()))?;

        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let aad = associated_data(key_version);
        let mut sealed = cipher
            .encrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: plaintext.as_slice(),
                    aad: aad.as_bytes(),
                },
            )
            .map_err(|e| EncryptionError::Cipher(e.to_string()))?;

        // aes-gcm appends the tag to the ciphertext
        if sealed.len() < TAG_LEN {
            return Err(EncryptionError::Cipher("sealed output shorter than tag".to_string()));
        }
        let auth_tag = sealed.split_off(sealed.len() - TAG_LEN);

        Ok(EncryptedPayload {
            ciphertext: sealed,
            iv: iv.to_vec(),
            auth_tag,
            key_version: key_version.clone(),
        })
    }

    /// Decrypts an envelope into a record
    ///
    /// # Errors
    ///
    /// Fails with [`DecryptionError::AuthenticationFailed`] on any tamper or
    /// corruption, and with a typed error for unknown versions or malformed
    /// envelopes.
    pub fn decrypt<T: DeserializeOwned>(&self, payload: &EncryptedPayload) -> Result<T, DecryptionError> {
        let plaintext = self.open(payload)?;
        serde_json::from_slice(&plaintext).map_err(|e| DecryptionError::Deserialization(e.to_string()))
    }

    /// Decrypts an envelope into a JSON value
    pub fn decrypt_value(&self, payload: &EncryptedPayload) -> Result<serde_json::Value, DecryptionError> {
        self.decrypt(payload)
    }

    fn open(&self, payload: &EncryptedPayload) -> Result<Zeroizing<Vec<u8>>, DecryptionError> {
        if payload.iv.len() != IV_LEN {
            return Err(DecryptionError::MalformedPayload(format!(
                "iv must be {IV_LEN} bytes, got {}",
                payload.iv.len()
            )));
        }
        if payload.auth_tag.len() != TAG_LEN {
            return Err(DecryptionError::MalformedPayload(format!(
                "auth tag must be {TAG_LEN} bytes, got {}",
                payload.auth_tag.len()
            )));
        }

        let key = self
            .resolver
            .resolve(&payload.key_version)
            .ok_or_else(|| DecryptionError::UnknownKeyVersion(payload.key_version.to_string()))?;

        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| DecryptionError::UnknownKeyVersion(payload.key_version.to_string()))?;

        let mut sealed = Vec::with_capacity(payload.ciphertext.len() + TAG_LEN);
        sealed.extend_from_slice(&payload.ciphertext);
        sealed.extend_from_slice(&payload.auth_tag);

        let aad = associated_data(&payload.key_version);
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(&payload.iv),
                Payload {
                    msg: sealed.as_slice(),
                    aad: aad.as_bytes(),
                },
            )
            .map_err(|_| DecryptionError::AuthenticationFailed)?;

        Ok(Zeroizing::new(plaintext))
    }
}

fn associated_data(key_version: &KeyVersion) -> String {
    format!("phigate:envelope:v1:{key_version}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::{KeyMaterial, StaticKeyResolver};
    use serde_json::{json, Value};
    use std::collections::{HashMap, HashSet};

    fn version(v: &str) -> KeyVersion {
        KeyVersion::new(v).unwrap()
    }

    fn engine_with(current: &str, versions: &[(&str, u8)]) -> EncryptionEngine {
        let keys: HashMap<_, _> = versions
            .iter()
            .map(|(v, b)| (version(v), KeyMaterial::from_slice(&[*b; 32]).unwrap()))
            .collect();
        let resolver = StaticKeyResolver::new(version(current), keys).unwrap();
        EncryptionEngine::new(Arc::new(resolver))
    }

    fn engine() -> EncryptionEngine {
        engine_with("v1", &[("v1", 1)])
    }

    #[test]
    fn test_round_trip() {
        let engine = engine();
        let record = json!({"severity": 7, "notes": "hot flashes", "tags": ["night"]});

        let payload = engine.encrypt(&record, &version("v1")).unwrap();
        assert_eq!(payload.iv.len(), IV_LEN);
        assert_eq!(payload.auth_tag.len(), TAG_LEN);
        assert_eq!(payload.key_version.as_str(), "v1");

        let back: Value = engine.decrypt(&payload).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_ciphertext_does_not_contain_plaintext() {
        let engine = engine();
        let payload = engine
            .encrypt(&json!({"diagnosis": "perimenopause"}), &version("v1"))
            .unwrap();
        let haystack = String::from_utf8_lossy(&payload.ciphertext);
        assert!(!haystack.contains("perimenopause"));
    }

    #[test]
    fn test_iv_is_fresh_for_identical_input() {
        let engine = engine();
        let record = json!({"severity": 7});
        let a = engine.encrypt(&record, &version("v1")).unwrap();
        let b = engine.encrypt(&record, &version("v1")).unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_ten_thousand_distinct_ivs() {
        let engine = engine();
        let record = json!({"severity": 7});
        let ivs: HashSet<Vec<u8>> = (0..10_000)
            .map(|_| engine.encrypt(&record, &version("v1")).unwrap().iv)
            .collect();
        assert_eq!(ivs.len(), 10_000);
    }

    #[test]
    fn test_every_single_bit_flip_is_detected() {
        let engine = engine();
        let payload = engine
            .encrypt(&json!({"severity": 7, "mood": "low"}), &version("v1"))
            .unwrap();

        for byte in 0..payload.ciphertext.len() {
            for bit in 0..8 {
                let mut tampered = payload.clone();
                tampered.ciphertext[byte] ^= 1 << bit;
                assert!(matches!(
                    engine.decrypt_value(&tampered),
                    Err(DecryptionError::AuthenticationFailed)
                ));
            }
        }

        for byte in 0..TAG_LEN {
            for bit in 0..8 {
                let mut tampered = payload.clone();
                tampered.auth_tag[byte] ^= 1 << bit;
                assert!(matches!(
                    engine.decrypt_value(&tampered),
                    Err(DecryptionError::AuthenticationFailed)
                ));
            }
        }
    }

    #[test]
    fn test_iv_tamper_detected() {
        let engine = engine();
        let mut payload = engine.encrypt(&json!({"a": 1}), &version("v1")).unwrap();
        payload.iv[0] ^= 0x01;
        assert!(matches!(
            engine.decrypt_value(&payload),
            Err(DecryptionError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_relabelled_key_version_fails() {
        // Same key bytes under two labels: only the AAD differs
        let engine = engine_with("v1", &[("v1", 3), ("v2", 3)]);
        let mut payload = engine.encrypt(&json!({"a": 1}), &version("v1")).unwrap();
        payload.key_version = version("v2");
        assert!(matches!(
            engine.decrypt_value(&payload),
            Err(DecryptionError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_unknown_key_version() {
        let engine = engine();
        assert!(matches!(
            engine.encrypt(&json!({}), &version("v7")),
            Err(EncryptionError::UnknownKeyVersion(_))
        ));

        let mut payload = engine.encrypt(&json!({}), &version("v1")).unwrap();
        payload.key_version = version("v7");
        assert!(matches!(
            engine.decrypt_value(&payload),
            Err(DecryptionError::UnknownKeyVersion(_))
        ));
    }

    #[test]
    fn test_malformed_payload() {
        let engine = engine();
        let mut payload = engine.encrypt(&json!({}), &version("v1")).unwrap();
        payload.auth_tag.truncate(4);
        assert!(matches!(
            engine.decrypt_value(&payload),
            Err(DecryptionError::MalformedPayload(_))
        ));

        let mut payload = engine.encrypt(&json!({}), &version("v1")).unwrap();
        payload.iv.push(0);
        assert!(matches!(
            engine.decrypt_value(&payload),
            Err(DecryptionError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_old_records_decrypt_after_rotation() {
        let before = engine_with("v1", &[("v1", 1)]);
        let payload = before.encrypt_current(&json!({"severity": 4})).unwrap();

        let after = engine_with("v2", &[("v1", 1), ("v2", 2)]);
        assert_eq!(after.current_key_version().as_str(), "v2");
        let back = after.decrypt_value(&payload).unwrap();
        assert_eq!(back, json!({"severity": 4}));

        let fresh = after.encrypt_current(&back).unwrap();
        assert_eq!(fresh.key_version.as_str(), "v2");
    }
}
