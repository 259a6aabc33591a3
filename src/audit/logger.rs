//! Audit logger
//!
//! Front door to the audit sink: builds entries from the caller's
//! [`AccessContext`] (hashing the actor) and writes each one with a single
//! sink call. No retries, no buffering.

use super::entry::{AuditEntry, AuditOperation};
use super::sink::AuditSink;
use crate::crypto::IndexHasher;
use crate::domain::{AccessContext, AuditWriteError};
use std::sync::Arc;

/// Audit logger over a sink
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
    hasher: IndexHasher,
}

impl AuditLogger {
    /// Creates a logger
    pub fn new(sink: Arc<dyn AuditSink>, hasher: IndexHasher) -> Self {
        Self { sink, hasher }
    }

    /// Starts an entry for a caller, table and operation
    pub fn entry(
        &self,
        ctx: &AccessContext,
        table_name: impl Into<String>,
        operation: AuditOperation,
    ) -> AuditEntry {
        AuditEntry::new(self.hasher.actor(&ctx.actor_id), ctx, table_name, operation)
    }

    /// Writes one entry
    ///
    /// # Errors
    ///
    /// Returns the sink's error unchanged; the write is not retried.
    pub async fn record(&self, entry: &AuditEntry) -> Result<(), AuditWriteError> {
        match self.sink.append(entry).await {
            Ok(()) => {
                tracing::trace!(
                    audit_id = %entry.id,
                    table = %entry.table_name,
                    operation = %entry.operation,
                    success = entry.success,
                    "Audit entry written"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    audit_id = %entry.id,
                    table = %entry.table_name,
                    operation = %entry.operation,
                    record_id = entry.record_id.as_deref().unwrap_or("-"),
                    error = %e,
                    "Audit write failed"
                );
                Err(e)
            }
        }
    }

    /// Underlying sink
    pub fn sink(&self) -> &Arc<dyn AuditSink> {
        &self.sink
    }

    /// Hasher used for actor ids
    pub fn hasher(&self) -> &IndexHasher {
        &self.hasher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;

    fn logger(sink: Arc<MemoryAuditSink>) -> AuditLogger {
        AuditLogger::new(sink, IndexHasher::new(b"logger-test-pepper-01").unwrap())
    }

    #[tokio::test]
    async fn test_entry_hashes_actor() {
        let sink = Arc::new(MemoryAuditSink::new());
        let logger = logger(sink.clone());
        let ctx = AccessContext::new("user-42", "self_access");

        let entry = logger.entry(&ctx, "mood_entries", AuditOperation::Select);
        assert_ne!(entry.actor_hash, "user-42");
        assert_eq!(entry.actor_hash, logger.hasher().actor("user-42"));

        logger.record(&entry).await.unwrap();
        let stored = sink.entries(None).await.unwrap();
        assert_eq!(stored, vec![entry]);
    }

    #[tokio::test]
    async fn test_record_surfaces_sink_failure() {
        let sink = Arc::new(MemoryAuditSink::new());
        sink.set_available(false);
        let logger = logger(sink);

        let entry = logger.entry(&AccessContext::system(), "phi_records", AuditOperation::Cleanup);
        assert!(logger.record(&entry).await.is_err());
    }
}
