//! Retention and deletion enforcer
//!
//! Hard-deletes expired PHI, processes due deletion requests and purges
//! audit entries past their own (longer) window. Passes are single-flight:
//! an overlapping call returns [`PhiGateError::EnforcementInProgress`]
//! without touching any store.
//!
//! Every purge attempt writes its own `CLEANUP` entry as the system actor.

use super::policy::RetentionPolicy;
use super::summary::RetentionSummary;
use crate::adapters::database::PhiStore;
use crate::audit::{AuditLogger, AuditOperation, OperationStage};
use crate::domain::{
    AccessContext, AuditWriteError, Classification, DeletionReason, DeletionRequest, PhiGateError,
    Result,
};
use crate::log_purge_complete;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, MutexGuard};

/// Table name recorded for PHI purges
pub const PHI_TABLE: &str = "phi_records";

/// Table name recorded for audit purges
pub const AUDIT_TABLE: &str = "audit_log";

/// Table name recorded when a deletion request is filed
pub const DELETION_REQUESTS_TABLE: &str = "deletion_requests";

/// Retention enforcer over the compliance store and the audit sink
pub struct RetentionEnforcer {
    phi_store: Arc<dyn PhiStore>,
    audit: AuditLogger,
    policy: RetentionPolicy,
    running: Mutex<()>,
}

impl RetentionEnforcer {
    /// Creates an enforcer
    pub fn new(phi_store: Arc<dyn PhiStore>, audit: AuditLogger, policy: RetentionPolicy) -> Self {
        Self {
            phi_store,
            audit,
            policy,
            running: Mutex::new(()),
        }
    }

    /// Applied policy
    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    fn try_begin(&self) -> Result<MutexGuard<'_, ()>> {
        self.running.try_lock().map_err(|_| {
            tracing::warn!("Retention pass already running, skipping");
            PhiGateError::EnforcementInProgress
        })
    }

    /// Files a consent revocation or erasure request for an owner
    ///
    /// Consent revocations become due after the grace period, erasure
    /// requests immediately. The raw owner id is hashed before it is stored.
    pub async fn file_deletion_request(
        &self,
        owner_id: &str,
        reason: DeletionReason,
        ctx: &AccessContext,
        now: DateTime<Utc>,
    ) -> Result<DeletionRequest> {
        ctx.validate()?;
        let owner_hash = self.audit.hasher().owner(owner_id);
        let request = DeletionRequest::new(owner_hash, reason, now, self.policy.consent_grace);

        let result = self.phi_store.insert_deletion_request(&request).await;

        let mut entry = self
            .audit
            .entry(ctx, DELETION_REQUESTS_TABLE, AuditOperation::Insert)
            .with_classification(Classification::Phi)
            .with_record(request.id.to_string())
            .with_details(json!({
                "reason": reason.as_str(),
                "effective_at": request.effective_at,
            }));
        if let Err(ref e) = result {
            entry = entry.failed(format!("{}: {e}", OperationStage::Stored));
        }
        finish(result, self.audit.record(&entry).await)?;

        tracing::info!(
            request_id = %request.id,
            reason = %reason,
            effective_at = %request.effective_at,
            "Deletion request filed"
        );
        Ok(request)
    }

    /// Hard-deletes PHI rows older than the retention window
    pub async fn purge_expired_phi(&self, now: DateTime<Utc>) -> Result<u64> {
        let _guard = self.try_begin()?;
        self.purge_phi(now).await
    }

    /// Purges audit entries older than the audit window
    pub async fn purge_expired_audit(&self, now: DateTime<Utc>) -> Result<u64> {
        let _guard = self.try_begin()?;
        self.purge_audit(now).await
    }

    /// Deletes all PHI of owners whose deletion request is due
    ///
    /// Returns the number of requests processed. A request whose delete
    /// fails stays pending and is retried on the next pass.
    pub async fn process_deletion_requests(&self, now: DateTime<Utc>) -> Result<usize> {
        let _guard = self.try_begin()?;
        self.process_requests(now).await
    }

    /// Runs a full pass: deletion requests, PHI purge, then audit purge
    ///
    /// Step failures are collected in the summary and do not stop later
    /// steps.
    pub async fn run_pass(&self, now: DateTime<Utc>) -> Result<RetentionSummary> {
        let _guard = self.try_begin()?;
        let started = Instant::now();
        let mut summary = RetentionSummary::new();

        match self.process_requests(now).await {
            Ok(processed) => summary.requests_processed = processed,
            Err(e) => summary.add_error("deletion_requests", &e),
        }
        match self.purge_phi(now).await {
            Ok(removed) => summary.phi_purged = removed,
            Err(e) => summary.add_error(PHI_TABLE, &e),
        }
        match self.purge_audit(now).await {
            Ok(removed) => summary.audit_purged = removed,
            Err(e) => summary.add_error(AUDIT_TABLE, &e),
        }

        let summary = summary.with_duration(started.elapsed());
        tracing::info!(
            requests_processed = summary.requests_processed,
            phi_purged = summary.phi_purged,
            audit_purged = summary.audit_purged,
            errors = summary.errors.len(),
            duration_ms = summary.duration.as_millis(),
            "Retention pass finished"
        );
        Ok(summary)
    }

    async fn purge_phi(&self, now: DateTime<Utc>) -> Result<u64> {
        let cutoff = self.policy.phi_cutoff(now);
        let result = self.phi_store.purge_created_before(cutoff).await;
        self.cleanup_entry(PHI_TABLE, None, json!({ "scope": "retention", "cutoff": cutoff }), &result)
            .await?;
        let removed = result?;
        log_purge_complete!(PHI_TABLE, removed);
        Ok(removed)
    }

    async fn purge_audit(&self, now: DateTime<Utc>) -> Result<u64> {
        let cutoff = self.policy.audit_cutoff(now);
        let result = self
            .audit
            .sink()
            .purge_before(cutoff)
            .await
            .map_err(PhiGateError::from);
        self.cleanup_entry(AUDIT_TABLE, None, json!({ "scope": "retention", "cutoff": cutoff }), &result)
            .await?;
        let removed = result?;
        log_purge_complete!(AUDIT_TABLE, removed);
        Ok(removed)
    }

    async fn process_requests(&self, now: DateTime<Utc>) -> Result<usize> {
        let due = match self
            .phi_store
            .due_deletion_requests(now, self.policy.batch_limit)
            .await
        {
            Ok(due) => due,
            Err(e) => {
                let failed: Result<u64> = Err(e);
                self.cleanup_entry(PHI_TABLE, None, json!({ "scope": "deletion_requests" }), &failed)
                    .await?;
                return failed.map(|_| 0);
            }
        };

        let mut processed = 0;
        for request in due {
            let result = match self.phi_store.delete_by_owner(&request.owner_hash).await {
                Ok(removed) => self
                    .phi_store
                    .mark_deletion_processed(request.id, now)
                    .await
                    .map(|()| removed),
                Err(e) => Err(e),
            };

            let details = json!({
                "scope": "deletion_request",
                "reason": request.reason.as_str(),
                "owner_hash": request.owner_hash,
                "requested_at": request.requested_at,
            });
            self.cleanup_entry(PHI_TABLE, Some(request.id.to_string()), details, &result)
                .await?;

            let removed = result?;
            tracing::info!(
                request_id = %request.id,
                reason = %request.reason,
                removed,
                "Deletion request processed"
            );
            processed += 1;
        }
        Ok(processed)
    }

    /// Writes the `CLEANUP` entry for one purge attempt
    ///
    /// An audit failure is only returned when the purge itself succeeded;
    /// otherwise the purge error is what the caller sees.
    async fn cleanup_entry(
        &self,
        table: &str,
        record_id: Option<String>,
        mut details: Value,
        result: &Result<u64>,
    ) -> Result<()> {
        let mut entry = self
            .audit
            .entry(&AccessContext::system(), table, AuditOperation::Cleanup)
            .with_classification(Classification::Phi);
        if let Some(id) = record_id {
            entry = entry.with_record(id);
        }
        match result {
            Ok(removed) => details["rows"] = json!(removed),
            Err(e) => entry = entry.failed(format!("{}: {e}", OperationStage::Stored)),
        }
        entry = entry.with_details(details);

        let written = self.audit.record(&entry).await;
        match result {
            Ok(_) => written.map_err(PhiGateError::from),
            Err(_) => Ok(()),
        }
    }
}

/// Combines an operation result with its audit write
fn finish<T>(
    result: Result<T>,
    audit: std::result::Result<(), AuditWriteError>,
) -> Result<T> {
    let value = result?;
    audit?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPhiStore;
    use crate::audit::{AuditSink, MemoryAuditSink};
    use crate::crypto::IndexHasher;

    fn enforcer() -> (RetentionEnforcer, Arc<InMemoryPhiStore>, Arc<MemoryAuditSink>) {
        let store = Arc::new(InMemoryPhiStore::new());
        let sink = Arc::new(MemoryAuditSink::new());
        let audit = AuditLogger::new(
            sink.clone(),
            IndexHasher::new(b"enforcer-unit-test-pepper").unwrap(),
        );
        (
            RetentionEnforcer::new(store.clone(), audit, RetentionPolicy::default()),
            store,
            sink,
        )
    }

    #[tokio::test]
    async fn test_overlapping_pass_is_rejected() {
        let (enforcer, _, sink) = enforcer();
        let _held = enforcer.try_begin().unwrap();

        let err = enforcer.run_pass(Utc::now()).await.unwrap_err();
        assert!(matches!(err, PhiGateError::EnforcementInProgress));
        assert!(sink.is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_pass_audits_each_purge() {
        let (enforcer, _, sink) = enforcer();
        let summary = enforcer.run_pass(Utc::now()).await.unwrap();

        assert!(summary.is_successful());
        let entries = sink.entries(None).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .all(|e| e.operation == AuditOperation::Cleanup && e.success));
    }

    #[tokio::test]
    async fn test_failed_purge_is_audited() {
        let (enforcer, store, sink) = enforcer();
        store.set_available(false);

        assert!(enforcer.purge_expired_phi(Utc::now()).await.is_err());
        let entries = sink.entries(Some(PHI_TABLE)).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].success);
    }

    #[tokio::test]
    async fn test_erasure_request_is_due_immediately() {
        let (enforcer, store, _) = enforcer();
        let now = Utc::now();
        let request = enforcer
            .file_deletion_request("user-9", DeletionReason::ErasureRequest, &AccessContext::new("user-9", "erasure"), now)
            .await
            .unwrap();

        assert_ne!(request.owner_hash, "user-9");
        assert_eq!(enforcer.process_deletion_requests(now).await.unwrap(), 1);
        assert!(store.deletion_requests().await[0].processed_at.is_some());
    }
}
