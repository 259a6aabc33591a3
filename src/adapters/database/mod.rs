//! Store abstraction layer
//!
//! Trait-based abstraction over the compliance store and the general-purpose
//! store, plus the factory that builds them from configuration.

pub mod factory;
pub mod traits;

pub use factory::{create_audit_sink, create_stores, Stores};
pub use traits::{GeneralStore, PhiQuery, PhiRow, PhiStore};
