use super::Availability;
use crate::adapters::database::traits::{PhiQuery, PhiRow, PhiStore};
use crate::domain::{CollectionName, DeletionRequest, Result, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Compliance store held in memory
#[derive(Debug)]
pub struct InMemoryPhiStore {
    rows: RwLock<Vec<PhiRow>>,
    requests: RwLock<Vec<DeletionRequest>>,
    availability: Availability,
}

impl InMemoryPhiStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            requests: RwLock::new(Vec::new()),
            availability: Availability::new("compliance store"),
        }
    }

    /// Toggles availability
    pub fn set_available(&self, available: bool) {
        self.availability.set(available);
    }

    /// Raw rows, as persisted (ciphertext only)
    pub async fn raw_rows(&self) -> Vec<PhiRow> {
        self.rows.read().await.clone()
    }

    /// Overwrites `created_at` of a row, for retention tests
    pub async fn backdate(&self, id: crate::domain::RecordId, created_at: DateTime<Utc>) {
        for row in self.rows.write().await.iter_mut().filter(|r| r.id == id) {
            row.created_at = created_at;
        }
    }

    /// All deletion requests, processed or not
    pub async fn deletion_requests(&self) -> Vec<DeletionRequest> {
        self.requests.read().await.clone()
    }
}

impl Default for InMemoryPhiStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PhiStore for InMemoryPhiStore {
    async fn test_connection(&self) -> Result<()> {
        self.availability.check()
    }

    async fn insert(&self, row: &PhiRow) -> Result<()> {
        self.availability.check()?;
        let mut rows = self.rows.write().await;
        if rows
            .iter()
            .any(|r| r.collection == row.collection && r.id == row.id)
        {
            return Err(StorageError::StatementFailed(format!(
                "duplicate key ({}, {})",
                row.collection, row.id
            ))
            .into());
        }
        rows.push(row.clone());
        Ok(())
    }

    async fn find(&self, collection: &CollectionName, query: &PhiQuery) -> Result<Vec<PhiRow>> {
        self.availability.check()?;
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|r| &r.collection == collection && query.matches(r))
            .cloned()
            .collect())
    }

    async fn replace(&self, row: &PhiRow, reassign_owner: bool) -> Result<u64> {
        self.availability.check()?;
        let mut rows = self.rows.write().await;
        match rows
            .iter_mut()
            .find(|r| r.collection == row.collection && r.id == row.id)
        {
            Some(existing) => {
                if reassign_owner {
                    existing.owner_hash = row.owner_hash.clone();
                }
                existing.payload = row.payload.clone();
                existing.index_hashes = row.index_hashes.clone();
                existing.updated_at = row.updated_at;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, collection: &CollectionName, query: &PhiQuery) -> Result<u64> {
        self.availability.check()?;
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| !(&r.collection == collection && query.matches(r)));
        Ok((before - rows.len()) as u64)
    }

    async fn delete_by_owner(&self, owner_hash: &str) -> Result<u64> {
        self.availability.check()?;
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| r.owner_hash != owner_hash);
        Ok((before - rows.len()) as u64)
    }

    async fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.availability.check()?;
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| r.created_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }

    async fn insert_deletion_request(&self, request: &DeletionRequest) -> Result<()> {
        self.availability.check()?;
        self.requests.write().await.push(request.clone());
        Ok(())
    }

    async fn due_deletion_requests(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<DeletionRequest>> {
        self.availability.check()?;
        let requests = self.requests.read().await;
        let mut due: Vec<DeletionRequest> =
            requests.iter().filter(|r| r.is_due(now)).cloned().collect();
        due.sort_by_key(|r| r.effective_at);
        due.truncate(limit);
        Ok(due)
    }

    async fn mark_deletion_processed(&self, id: Uuid, processed_at: DateTime<Utc>) -> Result<()> {
        self.availability.check()?;
        let mut requests = self.requests.write().await;
        match requests.iter_mut().find(|r| r.id == id) {
            Some(request) => {
                request.processed_at = Some(processed_at);
                Ok(())
            }
            None => Err(StorageError::NotFound(format!("deletion request {id}")).into()),
        }
    }
}
