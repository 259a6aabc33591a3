//! Data classification
//!
//! Maps every collection to PHI or NON_PHI using two explicit allow-lists.
//! Anything on neither list is PHI (fail-closed) and carries a
//! [`ClassificationWarning`](crate::domain::ClassificationWarning).

pub mod classifier;
pub mod policy;

pub use classifier::{ClassificationResult, Classifier};
pub use policy::{CollectionPolicy, TenantOverride};
