//! PHI strategy: envelope encryption against the compliance store
//!
//! Whole records are sealed into a single envelope. Owner and indexed fields
//! are additionally stored as keyed hashes so rows can be looked up without
//! ever decrypting in the store.

use super::record::{explicit_owner, owner_of, prepare_record};
use super::strategy::{Executed, StageFailure, StoreRequest, StoreStrategy};
use crate::adapters::database::{PhiQuery, PhiRow, PhiStore};
use crate::audit::{AuditLogger, AuditOperation, OperationStage, StageTracker};
use crate::crypto::{EncryptionEngine, IndexHasher};
use crate::domain::record::scalar_as_string;
use crate::domain::{
    Classification, CrudOperation, PhiGateError, RecordSelector, StoreOutcome, StoredRecord,
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Strategy for PHI collections
pub struct PhiStoreStrategy {
    store: Arc<dyn PhiStore>,
    engine: Arc<EncryptionEngine>,
    hasher: IndexHasher,
    audit: AuditLogger,
}

impl PhiStoreStrategy {
    /// Creates the strategy
    ///
    /// `audit` is used for the `PRE_DELETE` entry only; the router writes
    /// the final entry.
    pub fn new(
        store: Arc<dyn PhiStore>,
        engine: Arc<EncryptionEngine>,
        hasher: IndexHasher,
        audit: AuditLogger,
    ) -> Self {
        Self {
            store,
            engine,
            hasher,
            audit,
        }
    }

    fn index_hashes(&self, record: &Value, indexed_fields: &[String]) -> BTreeMap<String, String> {
        indexed_fields
            .iter()
            .filter_map(|field| {
                record
                    .get(field)
                    .and_then(scalar_as_string)
                    .map(|value| (field.clone(), self.hasher.field(field, &value)))
            })
            .collect()
    }

    /// Translates a plaintext selector into hashed criteria
    fn query(&self, selector: &RecordSelector, request: &StoreRequest<'_>) -> Result<PhiQuery, PhiGateError> {
        let mut query = PhiQuery {
            id: selector.id,
            owner_hash: selector.owner_id.as_deref().map(|o| self.hasher.owner(o)),
            index_hashes: BTreeMap::new(),
        };
        for (field, value) in &selector.fields {
            if !request.indexed_fields.iter().any(|f| f == field) {
                return Err(PhiGateError::Validation(format!(
                    "field '{field}' is not indexed for collection '{}'",
                    request.collection
                )));
            }
            query
                .index_hashes
                .insert(field.clone(), self.hasher.field(field, value));
        }
        Ok(query)
    }

    /// Prepares and seals a record into a row
    fn seal(
        &self,
        request: &StoreRequest<'_>,
        require_id: bool,
        tracker: &mut StageTracker,
    ) -> Result<PhiRow, StageFailure> {
        let (id, record) = prepare_record(request.data.clone(), require_id)
            .map_err(StageFailure::at(OperationStage::Encrypted))?;

        let payload = self
            .engine
            .encrypt_current(&record)
            .map_err(StageFailure::at(OperationStage::Encrypted))?;
        tracker.advance(OperationStage::Encrypted);

        let now = Utc::now();
        Ok(PhiRow {
            collection: request.collection.clone(),
            id,
            owner_hash: self.hasher.owner(&owner_of(&record, request.ctx)),
            payload,
            index_hashes: self.index_hashes(&record, request.indexed_fields),
            created_at: now,
            updated_at: now,
        })
    }

    async fn create(
        &self,
        request: &StoreRequest<'_>,
        tracker: &mut StageTracker,
    ) -> Result<Executed, StageFailure> {
        let row = self.seal(request, false, tracker)?;
        self.store
            .insert(&row)
            .await
            .map_err(StageFailure::at(OperationStage::Stored))?;
        tracker.advance(OperationStage::Stored);

        Ok(Executed {
            outcome: StoreOutcome::Created { id: row.id },
            record_id: Some(row.id.to_string()),
            details: Some(json!({
                "key_version": row.payload.key_version.as_str(),
                "indexed_fields": row.index_hashes.keys().collect::<Vec<_>>(),
            })),
        })
    }

    async fn read(
        &self,
        request: &StoreRequest<'_>,
        tracker: &mut StageTracker,
    ) -> Result<Executed, StageFailure> {
        let selector = RecordSelector::from_value(&request.data)
            .map_err(StageFailure::at(OperationStage::Retrieved))?;
        let query = self
            .query(&selector, request)
            .map_err(StageFailure::at(OperationStage::Retrieved))?;

        let rows = self
            .store
            .find(request.collection, &query)
            .await
            .map_err(StageFailure::at(OperationStage::Retrieved))?;
        tracker.advance(OperationStage::Retrieved);

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let data = self
                .engine
                .decrypt_value(&row.payload)
                .map_err(StageFailure::at(OperationStage::Decrypted))?;
            records.push(StoredRecord {
                id: row.id,
                data,
                created_at: row.created_at,
                updated_at: row.updated_at,
            });
        }
        tracker.advance(OperationStage::Decrypted);

        let count = records.len();
        Ok(Executed {
            outcome: StoreOutcome::Records(records),
            record_id: selector.id.map(|id| id.to_string()),
            details: Some(json!({ "criteria": query.to_value(), "rows": count })),
        })
    }

    async fn update(
        &self,
        request: &StoreRequest<'_>,
        tracker: &mut StageTracker,
    ) -> Result<Executed, StageFailure> {
        let row = self.seal(request, true, tracker)?;
        // Only an explicit `user_id` moves a record to another owner.
        let reassign_owner = explicit_owner(&request.data).is_some();
        let affected = self
            .store
            .replace(&row, reassign_owner)
            .await
            .map_err(StageFailure::at(OperationStage::Stored))?;
        tracker.advance(OperationStage::Stored);

        Ok(Executed {
            outcome: StoreOutcome::Updated { affected },
            record_id: Some(row.id.to_string()),
            details: Some(json!({
                "key_version": row.payload.key_version.as_str(),
                "rows": affected,
            })),
        })
    }

    async fn delete(
        &self,
        request: &StoreRequest<'_>,
        tracker: &mut StageTracker,
    ) -> Result<Executed, StageFailure> {
        let selector = RecordSelector::from_value(&request.data)
            .map_err(StageFailure::at(OperationStage::Stored))?;
        if selector.is_empty() {
            return Err(StageFailure::new(
                OperationStage::Stored,
                PhiGateError::Validation(
                    "PHI delete requires a non-empty selector".to_string(),
                ),
            ));
        }
        let query = self
            .query(&selector, request)
            .map_err(StageFailure::at(OperationStage::Stored))?;
        let record_id = selector.id.map(|id| id.to_string());

        // The pre-delete entry is the only trace of what the criteria were.
        let mut pre_delete = self
            .audit
            .entry(request.ctx, request.collection.as_str(), AuditOperation::PreDelete)
            .with_classification(Classification::Phi)
            .with_details(json!({ "criteria": query.to_value() }));
        if let Some(ref id) = record_id {
            pre_delete = pre_delete.with_record(id.clone());
        }
        self.audit
            .record(&pre_delete)
            .await
            .map_err(StageFailure::at(OperationStage::Stored))?;

        let affected = self
            .store
            .delete(request.collection, &query)
            .await
            .map_err(StageFailure::at(OperationStage::Stored))?;
        tracker.advance(OperationStage::Stored);

        Ok(Executed {
            outcome: StoreOutcome::Deleted { affected },
            record_id,
            details: Some(json!({
                "criteria": query.to_value(),
                "rows": affected,
                "pre_delete_entry": pre_delete.id.to_string(),
            })),
        })
    }
}

#[async_trait]
impl StoreStrategy for PhiStoreStrategy {
    fn classification(&self) -> Classification {
        Classification::Phi
    }

    async fn execute(
        &self,
        request: StoreRequest<'_>,
        tracker: &mut StageTracker,
    ) -> Result<Executed, StageFailure> {
        match request.operation {
            CrudOperation::Create => self.create(&request, tracker).await,
            CrudOperation::Read => self.read(&request, tracker).await,
            CrudOperation::Update => self.update(&request, tracker).await,
            CrudOperation::Delete => self.delete(&request, tracker).await,
        }
    }
}
