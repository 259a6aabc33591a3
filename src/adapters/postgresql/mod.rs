//! PostgreSQL integration
//!
//! Both physical stores can be PostgreSQL databases: the compliance store
//! (PHI ciphertext, deletion requests, audit log) and the general-purpose
//! store. Each gets its own [`PostgreSQLClient`] and pool.

pub mod audit;
pub mod client;
pub mod compliance;
pub mod general;
pub mod models;

pub use audit::PostgresAuditSink;
pub use client::{PostgreSQLClient, COMPLIANCE_SCHEMA, GENERAL_SCHEMA};
pub use compliance::PostgresPhiStore;
pub use general::PostgresGeneralStore;
