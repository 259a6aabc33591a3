//! Audit sink abstraction
//!
//! Sinks persist entries exactly as given. They perform no retries: a failed
//! append surfaces immediately as an [`AuditWriteError`] and the caller decides
//! what to do with it.

use super::entry::AuditEntry;
use crate::domain::AuditWriteError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Append-only audit store
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persists one entry
    ///
    /// # Errors
    ///
    /// Returns an error if the entry was not durably written.
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditWriteError>;

    /// Removes entries with a timestamp strictly before `cutoff`
    ///
    /// Only retention enforcement calls this. Returns the number removed.
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AuditWriteError>;

    /// Entries in write order, optionally restricted to one table
    async fn entries(&self, table_name: Option<&str>) -> Result<Vec<AuditEntry>, AuditWriteError>;
}
