//! PostgreSQL audit sink
//!
//! Appends to `audit_log` in the compliance database. The table rejects
//! updates through a trigger, so entries can only be inserted or purged.

use super::client::PostgreSQLClient;
use super::models::{audit_entry_from_row, AUDIT_COLUMNS};
use crate::audit::{AuditEntry, AuditSink};
use crate::domain::{AuditWriteError, PhiGateError, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Audit sink writing to the compliance database
pub struct PostgresAuditSink {
    client: Arc<PostgreSQLClient>,
}

impl PostgresAuditSink {
    /// Wraps a client connected to the compliance database
    pub fn new(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }
}

fn to_audit_error(err: PhiGateError) -> AuditWriteError {
    match err {
        PhiGateError::Storage(StorageError::Unavailable(msg))
        | PhiGateError::Storage(StorageError::ConnectionFailed(msg)) => {
            AuditWriteError::Unavailable(msg)
        }
        other => AuditWriteError::WriteFailed(other.to_string()),
    }
}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditWriteError> {
        let classification = entry.classification.map(|c| c.to_string());
        self.client
            .execute(
                "INSERT INTO audit_log (id, actor_hash, table_name, operation, occurred_at, ip, \
                 user_agent, session_id, success, error_message, minimum_necessary, \
                 authorized_purpose, consent_given, classification, record_id, details) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
                &[
                    &entry.id,
                    &entry.actor_hash,
                    &entry.table_name,
                    &entry.operation.as_str(),
                    &entry.timestamp,
                    &entry.ip,
                    &entry.user_agent,
                    &entry.session_id,
                    &entry.success,
                    &entry.error_message,
                    &entry.minimum_necessary,
                    &entry.authorized_purpose,
                    &entry.consent_given,
                    &classification,
                    &entry.record_id,
                    &entry.details,
                ],
            )
            .await
            .map_err(to_audit_error)?;
        Ok(())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AuditWriteError> {
        self.client
            .execute("DELETE FROM audit_log WHERE occurred_at < $1", &[&cutoff])
            .await
            .map_err(to_audit_error)
    }

    async fn entries(&self, table_name: Option<&str>) -> Result<Vec<AuditEntry>, AuditWriteError> {
        let sql = format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_log \
             WHERE ($1::text IS NULL OR table_name = $1) ORDER BY seq"
        );
        let rows = self
            .client
            .query(&sql, &[&table_name])
            .await
            .map_err(to_audit_error)?;
        rows.iter()
            .map(|row| audit_entry_from_row(row).map_err(to_audit_error))
            .collect()
    }
}
