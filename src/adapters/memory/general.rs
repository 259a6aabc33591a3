use super::Availability;
use crate::adapters::database::traits::GeneralStore;
use crate::domain::{CollectionName, RecordId, RecordSelector, Result, StorageError, StoredRecord};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Row {
    collection: CollectionName,
    record: StoredRecord,
}

/// General-purpose store held in memory
#[derive(Debug)]
pub struct InMemoryGeneralStore {
    rows: RwLock<Vec<Row>>,
    availability: Availability,
}

impl InMemoryGeneralStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            availability: Availability::new("general store"),
        }
    }

    /// Toggles availability
    pub fn set_available(&self, available: bool) {
        self.availability.set(available);
    }

    /// Number of rows across all collections
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl Default for InMemoryGeneralStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeneralStore for InMemoryGeneralStore {
    async fn test_connection(&self) -> Result<()> {
        self.availability.check()
    }

    async fn insert(&self, collection: &CollectionName, id: RecordId, data: &Value) -> Result<()> {
        self.availability.check()?;
        let mut rows = self.rows.write().await;
        if rows
            .iter()
            .any(|r| &r.collection == collection && r.record.id == id)
        {
            return Err(
                StorageError::StatementFailed(format!("duplicate key ({collection}, {id})")).into(),
            );
        }
        let now = Utc::now();
        rows.push(Row {
            collection: collection.clone(),
            record: StoredRecord {
                id,
                data: data.clone(),
                created_at: now,
                updated_at: now,
            },
        });
        Ok(())
    }

    async fn find(
        &self,
        collection: &CollectionName,
        selector: &RecordSelector,
    ) -> Result<Vec<StoredRecord>> {
        self.availability.check()?;
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|r| &r.collection == collection && selector.matches(&r.record.id, &r.record.data))
            .map(|r| r.record.clone())
            .collect())
    }

    async fn replace(&self, collection: &CollectionName, id: RecordId, data: &Value) -> Result<u64> {
        self.availability.check()?;
        let mut rows = self.rows.write().await;
        match rows
            .iter_mut()
            .find(|r| &r.collection == collection && r.record.id == id)
        {
            Some(row) => {
                row.record.data = data.clone();
                row.record.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, collection: &CollectionName, selector: &RecordSelector) -> Result<u64> {
        self.availability.check()?;
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| !(&r.collection == collection && selector.matches(&r.record.id, &r.record.data)));
        Ok((before - rows.len()) as u64)
    }
}
