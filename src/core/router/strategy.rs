//! Store strategies
//!
//! One strategy per [`Classification`]. The router picks the strategy once
//! and never branches on classification again.

use crate::audit::{OperationStage, StageTracker};
use crate::domain::{
    AccessContext, Classification, CollectionName, CrudOperation, PhiGateError, StoreOutcome,
};
use async_trait::async_trait;
use serde_json::Value;

/// A validated request handed to a strategy
#[derive(Debug)]
pub struct StoreRequest<'a> {
    /// Record (create/update) or selector (read/delete)
    pub data: Value,

    /// Target collection
    pub collection: &'a CollectionName,

    /// Requested operation
    pub operation: CrudOperation,

    /// Caller context
    pub ctx: &'a AccessContext,

    /// Fields of the collection that may be looked up by hash
    pub indexed_fields: &'a [String],
}

/// What a strategy did, for the audit entry
#[derive(Debug)]
pub struct Executed {
    /// Outcome returned to the caller
    pub outcome: StoreOutcome,

    /// Addressed record, when a single one is known
    pub record_id: Option<String>,

    /// Audit details (hashed criteria, counts, key version)
    pub details: Option<Value>,
}

/// Error raised while attempting `stage`
#[derive(Debug)]
pub struct StageFailure {
    /// Stage being attempted
    pub stage: OperationStage,

    /// Underlying error
    pub error: PhiGateError,
}

impl StageFailure {
    /// Creates a failure
    pub fn new(stage: OperationStage, error: impl Into<PhiGateError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }

    /// Adapter for `map_err`
    pub fn at<E: Into<PhiGateError>>(stage: OperationStage) -> impl FnOnce(E) -> Self {
        move |error| Self::new(stage, error)
    }
}

/// First stage a strategy attempts after classification
pub fn first_stage(classification: Classification, operation: CrudOperation) -> OperationStage {
    match (classification, operation) {
        (_, CrudOperation::Read) => OperationStage::Retrieved,
        (Classification::Phi, CrudOperation::Create | CrudOperation::Update) => {
            OperationStage::Encrypted
        }
        _ => OperationStage::Stored,
    }
}

/// Executes CRUD operations against one physical store
#[async_trait]
pub trait StoreStrategy: Send + Sync {
    /// Classification this strategy serves
    fn classification(&self) -> Classification;

    /// Runs one operation, advancing `tracker` as stages are reached
    async fn execute(
        &self,
        request: StoreRequest<'_>,
        tracker: &mut StageTracker,
    ) -> Result<Executed, StageFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_stage() {
        assert_eq!(
            first_stage(Classification::Phi, CrudOperation::Create),
            OperationStage::Encrypted
        );
        assert_eq!(
            first_stage(Classification::Phi, CrudOperation::Delete),
            OperationStage::Stored
        );
        assert_eq!(
            first_stage(Classification::NonPhi, CrudOperation::Update),
            OperationStage::Stored
        );
        assert_eq!(
            first_stage(Classification::NonPhi, CrudOperation::Read),
            OperationStage::Retrieved
        );
    }

    #[test]
    fn test_stage_failure_at() {
        let failure: StageFailure = Err::<(), _>(PhiGateError::Validation("bad".to_string()))
            .map_err(StageFailure::at(OperationStage::Stored))
            .unwrap_err();
        assert_eq!(failure.stage, OperationStage::Stored);
        assert!(matches!(failure.error, PhiGateError::Validation(_)));
    }
}
