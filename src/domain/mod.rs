//! Domain models and types for PhiGate.
//!
//! This module contains the types every other layer speaks: identifiers,
//! classifications, request/record shapes and the error hierarchy.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`CollectionName`], [`KeyVersion`], [`RecordId`])
//! - **Classification** ([`Classification`], [`ClassificationWarning`])
//! - **Request shapes** ([`CrudOperation`], [`AccessContext`], [`RecordSelector`])
//! - **Deletion requests** ([`DeletionRequest`], [`DeletionReason`])
//! - **Error types** ([`PhiGateError`] and its typed sub-enums)
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, PhiGateError>`]:
//!
//! ```rust
//! use phigate::domain::{CollectionName, PhiGateError, Result};
//!
//! fn parse(name: &str) -> Result<CollectionName> {
//!     CollectionName::new(name).map_err(PhiGateError::Validation)
//! }
//!
//! assert!(parse("menopause_symptoms").is_ok());
//! assert!(parse("Robert'); DROP TABLE").is_err());
//! ```

pub mod classification;
pub mod deletion;
pub mod errors;
pub mod ids;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use classification::{Classification, ClassificationWarning};
pub use deletion::{DeletionReason, DeletionRequest};
pub use errors::{AuditWriteError, DecryptionError, EncryptionError, PhiGateError, StorageError};
pub use ids::{CollectionName, KeyVersion, RecordId};
pub use record::{AccessContext, CrudOperation, RecordSelector, StoreOutcome, StoredRecord};
pub use result::Result;
