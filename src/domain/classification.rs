//! Data classification types
//!
//! A classification is computed per call from the collection name and is
//! never persisted as part of the record itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sensitivity class of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// Protected health information: encrypted, compliance store only
    Phi,
    /// Ordinary application data: general-purpose store, unencrypted
    NonPhi,
}

impl Classification {
    /// Whether this class requires envelope encryption
    pub fn requires_encryption(&self) -> bool {
        matches!(self, Classification::Phi)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phi => write!(f, "PHI"),
            Self::NonPhi => write!(f, "NON_PHI"),
        }
    }
}

/// Non-fatal warning raised when a collection is on neither allow-list
///
/// The collection is treated as PHI until it is explicitly allow-listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationWarning {
    /// Collection that matched neither list
    pub collection: String,

    /// Classification applied by default
    pub defaulted_to: Classification,
}

impl ClassificationWarning {
    /// Creates a warning for an unrecognized collection
    pub fn unrecognized(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            defaulted_to: Classification::Phi,
        }
    }
}

impl fmt::Display for ClassificationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "collection '{}' is not allow-listed, defaulting to {}",
            self.collection, self.defaulted_to
        )
    }
}
