//! Dual-store router
//!
//! The single entry point feature code uses for persistence. Every call is
//! classified first, dispatched to exactly one [`StoreStrategy`], and audited
//! exactly once whether it succeeds or fails. PHI deletes additionally write
//! a `PRE_DELETE` entry before the rows are removed.
//!
//! # Example
//!
//! ```rust
//! use phigate::adapters::memory::{InMemoryGeneralStore, InMemoryPhiStore};
//! use phigate::audit::{AuditLogger, MemoryAuditSink};
//! use phigate::classification::{Classifier, CollectionPolicy};
//! use phigate::core::router::Router;
//! use phigate::crypto::{EncryptionEngine, IndexHasher, KeyMaterial, StaticKeyResolver};
//! use phigate::domain::{AccessContext, CrudOperation, KeyVersion, StoreOutcome};
//! use serde_json::json;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! # async fn example() -> phigate::domain::Result<()> {
//! let version = KeyVersion::new("v1").unwrap();
//! let mut keys = HashMap::new();
//! keys.insert(version.clone(), KeyMaterial::from_slice(&[7u8; 32]).unwrap());
//! let engine = Arc::new(EncryptionEngine::new(Arc::new(StaticKeyResolver::new(version, keys)?)));
//! let hasher = IndexHasher::new(b"example-pepper-0123456789")?;
//!
//! let router = Router::new(
//!     Arc::new(Classifier::new(CollectionPolicy::default_health_platform())),
//!     engine,
//!     hasher.clone(),
//!     Arc::new(InMemoryPhiStore::new()),
//!     Arc::new(InMemoryGeneralStore::new()),
//!     AuditLogger::new(Arc::new(MemoryAuditSink::new()), hasher),
//! );
//!
//! let ctx = AccessContext::new("user-1", "self_access");
//! let outcome = router
//!     .store(json!({"severity": 7}), "menopause_symptoms", CrudOperation::Create, &ctx)
//!     .await?;
//! assert!(matches!(outcome, StoreOutcome::Created { .. }));
//! # Ok(())
//! # }
//! ```

pub mod general;
pub mod phi;
pub mod record;
pub mod strategy;

pub use general::NonPhiStoreStrategy;
pub use phi::PhiStoreStrategy;
pub use strategy::{StageFailure, StoreRequest, StoreStrategy};

use crate::adapters::database::{GeneralStore, PhiStore};
use crate::audit::{AuditLogger, OperationStage, StageTracker};
use crate::classification::{ClassificationResult, Classifier};
use crate::crypto::{EncryptionEngine, IndexHasher};
use crate::domain::{
    AccessContext, Classification, CollectionName, CrudOperation, PhiGateError, Result,
    StoreOutcome,
};
use crate::{log_error_with_context, log_store_outcome};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use strategy::{first_stage, Executed};

/// Dual-store router
///
/// `Send + Sync`; share it through an `Arc`. Holds no locks on the request
/// path.
pub struct Router {
    classifier: Arc<Classifier>,
    phi: PhiStoreStrategy,
    non_phi: NonPhiStoreStrategy,
    audit: AuditLogger,
}

impl Router {
    /// Creates a router over both stores
    pub fn new(
        classifier: Arc<Classifier>,
        engine: Arc<EncryptionEngine>,
        hasher: IndexHasher,
        phi_store: Arc<dyn PhiStore>,
        general_store: Arc<dyn GeneralStore>,
        audit: AuditLogger,
    ) -> Self {
        Self {
            classifier,
            phi: PhiStoreStrategy::new(phi_store, engine, hasher, audit.clone()),
            non_phi: NonPhiStoreStrategy::new(general_store),
            audit,
        }
    }

    /// Classifies a collection for a caller, without touching any store
    pub fn classify(&self, collection: &str, ctx: &AccessContext) -> ClassificationResult {
        self.classifier
            .classify_for(ctx.tenant_id.as_deref(), collection)
    }

    /// Audit logger used by this router
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Routes one CRUD operation
    ///
    /// `data` is the record for create/update and an equality selector for
    /// read/delete. Exactly one audit entry with the matching table and
    /// operation is written per call.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed request (checked before any store is touched)
    /// - `Encryption` / `Decryption` for crypto failures; nothing partial is
    ///   written or returned
    /// - `Storage` when the target store is unavailable or rejects the statement
    /// - `AuditWrite` when the operation succeeded but its audit entry could
    ///   not be written
    pub async fn store(
        &self,
        data: Value,
        collection: &str,
        operation: CrudOperation,
        ctx: &AccessContext,
    ) -> Result<StoreOutcome> {
        let started = Instant::now();
        let mut tracker = StageTracker::new();

        let classified = self.classify(collection, ctx);
        if let Some(ref warning) = classified.warning {
            tracing::warn!(
                collection = %warning.collection,
                defaulted_to = %warning.defaulted_to,
                "Collection is not allow-listed, routing as PHI"
            );
        }
        tracker.advance(OperationStage::Classified);

        let classification = classified.classification;
        let mut entry = self
            .audit
            .entry(ctx, collection, operation.into())
            .with_classification(classification);

        match self
            .dispatch(data, collection, operation, ctx, classification, &mut tracker)
            .await
        {
            Ok(executed) => {
                if let Some(id) = executed.record_id {
                    entry = entry.with_record(id);
                }
                if let Some(details) = executed.details {
                    entry = entry.with_details(details);
                }

                if let Err(e) = self.audit.record(&entry).await {
                    let message = tracker.fail(OperationStage::Audited, &e);
                    tracing::error!(
                        collection = %collection,
                        operation = %operation,
                        error = %message,
                        "Operation succeeded without an audit entry"
                    );
                    return Err(PhiGateError::AuditWrite(e));
                }
                tracker.advance(OperationStage::Audited);
                tracker.advance(OperationStage::Complete);

                log_store_outcome!(
                    collection,
                    operation,
                    classification,
                    executed.outcome.row_count(),
                    started.elapsed()
                );
                Ok(executed.outcome)
            }
            Err(failure) => {
                let reached = tracker.last_active();
                let message = tracker.fail(failure.stage, &failure.error);
                entry = entry.failed(message);

                // The operation error takes precedence; the audit failure is
                // already logged by the audit logger.
                let _ = self.audit.record(&entry).await;

                log_error_with_context!(&failure.error, "Store operation failed");
                tracing::debug!(
                    collection = %collection,
                    operation = %operation,
                    stage = %failure.stage,
                    reached = %reached,
                    "Failed store operation audited"
                );
                Err(failure.error)
            }
        }
    }

    async fn dispatch(
        &self,
        data: Value,
        collection: &str,
        operation: CrudOperation,
        ctx: &AccessContext,
        classification: Classification,
        tracker: &mut StageTracker,
    ) -> std::result::Result<Executed, StageFailure> {
        let first = first_stage(classification, operation);

        ctx.validate().map_err(StageFailure::at(first))?;
        let name = CollectionName::new(collection)
            .map_err(|e| StageFailure::new(first, PhiGateError::Validation(e)))?;
        let indexed_fields = self
            .classifier
            .policy_for(ctx.tenant_id.as_deref())
            .indexed_fields(&name);

        let request = StoreRequest {
            data,
            collection: &name,
            operation,
            ctx,
            indexed_fields,
        };

        let strategy: &dyn StoreStrategy = match classification {
            Classification::Phi => &self.phi,
            Classification::NonPhi => &self.non_phi,
        };
        strategy.execute(request, tracker).await
    }
}
