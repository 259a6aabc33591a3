//! NON_PHI strategy: plain CRUD against the general-purpose store

use super::record::prepare_record;
use super::strategy::{Executed, StageFailure, StoreRequest, StoreStrategy};
use crate::adapters::database::GeneralStore;
use crate::audit::{OperationStage, StageTracker};
use crate::domain::{Classification, CrudOperation, RecordSelector, StoreOutcome};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

/// Strategy for NON_PHI collections
pub struct NonPhiStoreStrategy {
    store: Arc<dyn GeneralStore>,
}

impl NonPhiStoreStrategy {
    /// Creates the strategy
    pub fn new(store: Arc<dyn GeneralStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StoreStrategy for NonPhiStoreStrategy {
    fn classification(&self) -> Classification {
        Classification::NonPhi
    }

    async fn execute(
        &self,
        request: StoreRequest<'_>,
        tracker: &mut StageTracker,
    ) -> Result<Executed, StageFailure> {
        match request.operation {
            CrudOperation::Create => {
                let (id, record) = prepare_record(request.data, false).map_err(StageFailure::at(OperationStage::Stored))?;
                self.store
                    .insert(request.collection, id, &record)
                    .await
                    .map_err(StageFailure::at(OperationStage::Stored))?;
                tracker.advance(OperationStage::Stored);
                Ok(Executed {
                    outcome: StoreOutcome::Created { id },
                    record_id: Some(id.to_string()),
                    details: None,
                })
            }
            CrudOperation::Read => {
                let selector = RecordSelector::from_value(&request.data)
                    .map_err(StageFailure::at(OperationStage::Retrieved))?;
                let records = self
                    .store
                    .find(request.collection, &selector)
                    .await
                    .map_err(StageFailure::at(OperationStage::Retrieved))?;
                tracker.advance(OperationStage::Retrieved);
                let count = records.len();
                Ok(Executed {
                    outcome: StoreOutcome::Records(records),
                    record_id: selector.id.map(|id| id.to_string()),
                    details: Some(json!({ "rows": count })),
                })
            }
            CrudOperation::Update => {
                let (id, record) = prepare_record(request.data, true).map_err(StageFailure::at(OperationStage::Stored))?;
                let affected = self
                    .store
                    .replace(request.collection, id, &record)
                    .await
                    .map_err(StageFailure::at(OperationStage::Stored))?;
                tracker.advance(OperationStage::Stored);
                Ok(Executed {
                    outcome: StoreOutcome::Updated { affected },
                    record_id: Some(id.to_string()),
                    details: Some(json!({ "rows": affected })),
                })
            }
            CrudOperation::Delete => {
                let selector = RecordSelector::from_value(&request.data).map_err(StageFailure::at(OperationStage::Stored))?;
                let affected = self
                    .store
                    .delete(request.collection, &selector)
                    .await
                    .map_err(StageFailure::at(OperationStage::Stored))?;
                tracker.advance(OperationStage::Stored);
                Ok(Executed {
                    outcome: StoreOutcome::Deleted { affected },
                    record_id: selector.id.map(|id| id.to_string()),
                    details: Some(json!({ "rows": affected })),
                })
            }
        }
    }
}
