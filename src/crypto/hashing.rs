//! Keyed one-way hashes for lookup columns
//!
//! PHI rows cannot be filtered on ciphertext, so owner ids, actor ids and
//! configured indexed fields are stored as HMAC-SHA256 digests under a
//! server-side pepper. Each use gets its own domain label so the same value
//! hashes differently as an owner and as an actor.

use crate::domain::{PhiGateError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt::Write as _;

type HmacSha256 = Hmac<Sha256>;

/// Minimum pepper length in bytes
pub const MIN_PEPPER_LEN: usize = 16;

/// HMAC-SHA256 index hasher
#[derive(Clone)]
pub struct IndexHasher {
    mac: HmacSha256,
}

impl IndexHasher {
    /// Creates a hasher keyed by the pepper
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pepper is shorter than 16 bytes.
    pub fn new(pepper: &[u8]) -> Result<Self> {
        if pepper.len() < MIN_PEPPER_LEN {
            return Err(PhiGateError::Configuration(format!(
                "index pepper must be at least {MIN_PEPPER_LEN} bytes"
            )));
        }
        let mac = <HmacSha256 as Mac>::new_from_slice(pepper)
            .map_err(|e| PhiGateError::Configuration(format!("invalid index pepper: {e}")))?;
        Ok(Self { mac })
    }

    /// Hash of a record owner id
    pub fn owner(&self, owner_id: &str) -> String {
        self.hash("owner", owner_id)
    }

    /// Hash of an acting user or service id
    pub fn actor(&self, actor_id: &str) -> String {
        self.hash("actor", actor_id)
    }

    /// Hash of an indexed field value
    pub fn field(&self, field: &str, value: &str) -> String {
        self.hash(&format!("field:{field}"), value)
    }

    fn hash(&self, domain: &str, value: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(domain.as_bytes());
        mac.update(&[0u8]);
        mac.update(value.as_bytes());
        let digest = mac.finalize().into_bytes();

        let mut out = String::with_capacity(digest.len() * 2);
        for byte in digest.iter() {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl std::fmt::Debug for IndexHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IndexHasher([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> IndexHasher {
        IndexHasher::new(b"0123456789abcdef-pepper").unwrap()
    }

    #[test]
    fn test_short_pepper_rejected() {
        assert!(IndexHasher::new(b"short").is_err());
    }

    #[test]
    fn test_hash_is_deterministic_hex() {
        let h = hasher();
        let a = h.owner("user-1");
        assert_eq!(a, h.owner("user-1"));
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(!a.contains("user-1"));
    }

    #[test]
    fn test_domains_are_separated() {
        let h = hasher();
        assert_ne!(h.owner("user-1"), h.actor("user-1"));
        assert_ne!(h.field("logged_on", "x"), h.field("severity", "x"));
    }

    #[test]
    fn test_pepper_changes_hash() {
        let other = IndexHasher::new(b"another-pepper-of-length").unwrap();
        assert_ne!(hasher().owner("user-1"), other.owner("user-1"));
    }
}
