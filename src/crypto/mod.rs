//! Envelope encryption and index hashing
//!
//! - [`EncryptionEngine`]: AES-256-GCM whole-record envelopes
//! - [`KeyResolver`]: key version to key material, external to the engine
//! - [`IndexHasher`]: keyed one-way hashes for lookup columns

pub mod engine;
pub mod hashing;
pub mod keys;
pub mod payload;

pub use engine::EncryptionEngine;
pub use hashing::IndexHasher;
pub use keys::{KeyMaterial, KeyResolver, StaticKeyResolver};
pub use payload::EncryptedPayload;
