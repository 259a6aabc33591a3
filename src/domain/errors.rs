//! Domain error types
//!
//! This module defines the error hierarchy for PhiGate. Every failure that can
//! leave the compliance core is one of the typed variants below; nothing is
//! retried inside this layer, so callers decide on retry and backoff.
//! Errors never carry third-party types or plaintext PHI.

use thiserror::Error;

/// Main PhiGate error type
///
/// This is the primary error type used throughout the crate.
/// Store, crypto and audit failures are wrapped in their own sub-enums.
#[derive(Debug, Error)]
pub enum PhiGateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Envelope encryption failed, nothing was written
    #[error("Encryption error: {0}")]
    Encryption(#[from] EncryptionError),

    /// Envelope decryption failed, nothing was returned
    #[error("Decryption error: {0}")]
    Decryption(#[from] DecryptionError),

    /// Underlying store unavailable or rejected the statement
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The audit write itself failed
    #[error("Audit write error: {0}")]
    AuditWrite(#[from] AuditWriteError),

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// A retention pass is already running
    #[error("Retention enforcement already in progress")]
    EnforcementInProgress,
}

/// Envelope encryption errors
#[derive(Debug, Error)]
pub enum EncryptionError {
    /// The record could not be serialized before encryption
    #[error("Failed to serialize record: {0}")]
    Serialization(String),

    /// The requested key version is not known to the key resolver
    #[error("Unknown key version: {0}")]
    UnknownKeyVersion(String),

    /// Key material has the wrong length or shape
    #[error("Invalid key material for version {0}")]
    InvalidKey(String),

    /// The AEAD cipher rejected the input
    #[error("Cipher failure: {0}")]
    Cipher(String),
}

/// Envelope decryption errors
///
/// Any of these means the payload is not returned, not even partially.
#[derive(Debug, Error)]
pub enum DecryptionError {
    /// Authentication tag verification failed (tamper or corruption)
    #[error("Authentication tag verification failed")]
    AuthenticationFailed,

    /// The payload's key version cannot be resolved
    #[error("Unknown key version: {0}")]
    UnknownKeyVersion(String),

    /// IV, tag or ciphertext has an invalid shape
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The plaintext is not a valid record
    #[error("Failed to deserialize record: {0}")]
    Deserialization(String),
}

/// Store errors
///
/// Raised by the compliance store and the general-purpose store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Store is unreachable (outage, pool exhausted)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Failed to establish a connection
    #[error("Failed to connect to store: {0}")]
    ConnectionFailed(String),

    /// The store rejected the statement
    #[error("Statement failed: {0}")]
    StatementFailed(String),

    /// The addressed record does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A row could not be mapped back into a domain value
    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

/// Audit sink errors
#[derive(Debug, Error)]
pub enum AuditWriteError {
    /// Sink is unreachable
    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),

    /// Sink accepted the connection but the write failed
    #[error("Failed to write audit entry: {0}")]
    WriteFailed(String),

    /// Entry could not be serialized
    #[error("Failed to serialize audit entry: {0}")]
    Serialization(String),
}

impl PhiGateError {
    /// Whether this error came from the underlying store
    pub fn is_storage(&self) -> bool {
        matches!(self, PhiGateError::Storage(_))
    }

    /// Whether this error is a crypto failure
    pub fn is_crypto(&self) -> bool {
        matches!(
            self,
            PhiGateError::Encryption(_) | PhiGateError::Decryption(_)
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for PhiGateError {
    fn from(err: std::io::Error) -> Self {
        PhiGateError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for PhiGateError {
    fn from(err: serde_json::Error) -> Self {
        PhiGateError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for PhiGateError {
    fn from(err: toml::de::Error) -> Self {
        PhiGateError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phigate_error_display() {
        let err = PhiGateError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_storage_error_conversion() {
        let storage_err = StorageError::Unavailable("connection refused".to_string());
        let err: PhiGateError = storage_err.into();
        assert!(err.is_storage());
        assert!(!err.is_crypto());
    }

    #[test]
    fn test_decryption_error_conversion() {
        let err: PhiGateError = DecryptionError::AuthenticationFailed.into();
        assert!(err.is_crypto());
        assert_eq!(
            err.to_string(),
            "Decryption error: Authentication tag verification failed"
        );
    }

    #[test]
    fn test_encryption_error_conversion() {
        let err: PhiGateError = EncryptionError::UnknownKeyVersion("v9".to_string()).into();
        assert!(matches!(err, PhiGateError::Encryption(_)));
    }

    #[test]
    fn test_audit_write_error_conversion() {
        let err: PhiGateError = AuditWriteError::WriteFailed("disk full".to_string()).into();
        assert!(matches!(err, PhiGateError::AuditWrite(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: PhiGateError = io_err.into();
        assert!(matches!(err, PhiGateError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: PhiGateError = json_err.into();
        assert!(matches!(err, PhiGateError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: PhiGateError = toml_err.into();
        assert!(matches!(err, PhiGateError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_errors_implement_std_error() {
        let _: &dyn std::error::Error = &PhiGateError::EnforcementInProgress;
        let _: &dyn std::error::Error = &StorageError::NotFound("x".to_string());
        let _: &dyn std::error::Error = &AuditWriteError::Unavailable("x".to_string());
    }
}
