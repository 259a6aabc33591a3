//! Append-only audit trail
//!
//! Every routed operation and every retention pass produces exactly one
//! [`AuditEntry`]; PHI deletes additionally produce a `PRE_DELETE` entry that
//! captures the hashed selection criteria before the rows are removed.
//!
//! Sinks: [`MemoryAuditSink`], [`FileAuditSink`] and the PostgreSQL
//! `audit_log` table in [`crate::adapters::postgresql`].

pub mod entry;
pub mod file;
pub mod logger;
pub mod memory;
pub mod sink;

pub use entry::{AuditEntry, AuditOperation, OperationStage, StageTracker};
pub use file::FileAuditSink;
pub use logger::AuditLogger;
pub use memory::MemoryAuditSink;
pub use sink::AuditSink;
