//! Store abstraction traits
//!
//! This module defines the traits that store adapters must implement to work
//! with PhiGate. The compliance store only ever sees ciphertext and keyed
//! hashes; the general store sees plain JSON.

use crate::crypto::EncryptedPayload;
use crate::domain::{CollectionName, DeletionRequest, RecordId, RecordSelector, Result, StoredRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// One row of the compliance store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhiRow {
    /// Collection the record belongs to
    pub collection: CollectionName,

    /// Record id
    pub id: RecordId,

    /// Keyed hash of the owning user
    pub owner_hash: String,

    /// Whole-record envelope
    pub payload: EncryptedPayload,

    /// Indexed field name -> keyed hash of its value
    pub index_hashes: BTreeMap<String, String>,

    /// Creation time, drives retention
    pub created_at: DateTime<Utc>,

    /// Last replacement time
    pub updated_at: DateTime<Utc>,
}

/// Equality criteria against the compliance store's hashed columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhiQuery {
    /// Record id
    pub id: Option<RecordId>,

    /// Keyed hash of the owner
    pub owner_hash: Option<String>,

    /// Indexed field name -> keyed hash that must match
    pub index_hashes: BTreeMap<String, String>,
}

impl PhiQuery {
    /// Whether the query would match the whole collection
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.owner_hash.is_none() && self.index_hashes.is_empty()
    }

    /// Checks a row against the query
    pub fn matches(&self, row: &PhiRow) -> bool {
        self.id.map(|id| id == row.id).unwrap_or(true)
            && self
                .owner_hash
                .as_ref()
                .map(|h| h == &row.owner_hash)
                .unwrap_or(true)
            && self
                .index_hashes
                .iter()
                .all(|(k, v)| row.index_hashes.get(k) == Some(v))
    }

    /// Query rendered as JSON for audit details (hashes only)
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "id": self.id.map(|id| id.to_string()),
            "owner_hash": self.owner_hash,
            "index_hashes": self.index_hashes,
        })
    }
}

/// Compliance store for PHI envelopes
///
/// Reachable only through the router and the retention enforcer.
#[async_trait]
pub trait PhiStore: Send + Sync {
    /// Test the store connection
    async fn test_connection(&self) -> Result<()>;

    /// Insert a new row
    async fn insert(&self, row: &PhiRow) -> Result<()>;

    /// Rows of a collection matching the query, oldest first
    async fn find(&self, collection: &CollectionName, query: &PhiQuery) -> Result<Vec<PhiRow>>;

    /// Replace envelope and index hashes of an existing row
    ///
    /// The stored owner hash is overwritten only when `reassign_owner` is
    /// set. Returns the number of rows affected (0 or 1).
    async fn replace(&self, row: &PhiRow, reassign_owner: bool) -> Result<u64>;

    /// Delete rows of a collection matching the query
    async fn delete(&self, collection: &CollectionName, query: &PhiQuery) -> Result<u64>;

    /// Delete every row of an owner across all collections
    async fn delete_by_owner(&self, owner_hash: &str) -> Result<u64>;

    /// Delete every row created strictly before `cutoff`
    async fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Persist a deletion request
    async fn insert_deletion_request(&self, request: &DeletionRequest) -> Result<()>;

    /// Unprocessed requests with `effective_at <= now`, oldest first
    async fn due_deletion_requests(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<DeletionRequest>>;

    /// Mark a request processed
    async fn mark_deletion_processed(&self, id: Uuid, processed_at: DateTime<Utc>) -> Result<()>;
}

/// General-purpose store for NON_PHI records
#[async_trait]
pub trait GeneralStore: Send + Sync {
    /// Test the store connection
    async fn test_connection(&self) -> Result<()>;

    /// Insert a new record
    async fn insert(&self, collection: &CollectionName, id: RecordId, data: &Value) -> Result<()>;

    /// Records matching the selector, oldest first
    async fn find(
        &self,
        collection: &CollectionName,
        selector: &RecordSelector,
    ) -> Result<Vec<StoredRecord>>;

    /// Replace the payload of a record
    async fn replace(&self, collection: &CollectionName, id: RecordId, data: &Value) -> Result<u64>;

    /// Delete records matching the selector
    async fn delete(&self, collection: &CollectionName, selector: &RecordSelector) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::KeyVersion;

    fn row(owner: &str) -> PhiRow {
        let mut index_hashes = BTreeMap::new();
        index_hashes.insert("logged_on".to_string(), "aa".to_string());
        PhiRow {
            collection: CollectionName::new("symptom_logs").unwrap(),
            id: RecordId::generate(),
            owner_hash: owner.to_string(),
            payload: EncryptedPayload {
                ciphertext: vec![1],
                iv: vec![0; 12],
                auth_tag: vec![0; 16],
                key_version: KeyVersion::new("v1").unwrap(),
            },
            index_hashes,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(PhiQuery::default().is_empty());
        assert!(PhiQuery::default().matches(&row("o1")));
    }

    #[test]
    fn test_query_matches_hashed_columns() {
        let r = row("o1");
        let mut query = PhiQuery {
            owner_hash: Some("o1".to_string()),
            ..PhiQuery::default()
        };
        assert!(query.matches(&r));

        query.index_hashes.insert("logged_on".to_string(), "bb".to_string());
        assert!(!query.matches(&r));

        let by_id = PhiQuery {
            id: Some(r.id),
            ..PhiQuery::default()
        };
        assert!(by_id.matches(&r));
        assert!(!by_id.matches(&row("o1")));
    }
}
