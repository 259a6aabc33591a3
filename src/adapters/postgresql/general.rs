//! PostgreSQL general-purpose store
//!
//! Non-PHI collections share one `app_records` table. Selectors are passed
//! as a JSONB parameter and matched field by field against the record.

use super::client::PostgreSQLClient;
use super::models::stored_record_from_row;
use crate::adapters::database::traits::GeneralStore;
use crate::domain::record::OWNER_FIELD;
use crate::domain::{CollectionName, RecordId, RecordSelector, Result, StoredRecord};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

const SELECTOR_FILTER: &str = "collection = $1 \
     AND ($2::uuid IS NULL OR id = $2) \
     AND NOT EXISTS ( \
         SELECT 1 FROM jsonb_each_text($3::jsonb) c \
         WHERE app_records.data ->> c.key IS DISTINCT FROM c.value)";

/// General-purpose store backed by PostgreSQL
pub struct PostgresGeneralStore {
    client: Arc<PostgreSQLClient>,
}

impl PostgresGeneralStore {
    /// Wraps a client connected to the general-purpose database
    pub fn new(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }
}

/// Field criteria of a selector as a flat JSON object of strings
fn criteria(selector: &RecordSelector) -> Value {
    let mut map = Map::new();
    if let Some(ref owner) = selector.owner_id {
        map.insert(OWNER_FIELD.to_string(), Value::String(owner.clone()));
    }
    for (key, value) in &selector.fields {
        map.insert(key.clone(), Value::String(value.clone()));
    }
    Value::Object(map)
}

#[async_trait]
impl GeneralStore for PostgresGeneralStore {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn insert(&self, collection: &CollectionName, id: RecordId, data: &Value) -> Result<()> {
        self.client
            .execute(
                "INSERT INTO app_records (collection, id, data, created_at, updated_at) \
                 VALUES ($1, $2, $3, NOW(), NOW())",
                &[&collection.as_str(), id.as_uuid(), data],
            )
            .await?;
        Ok(())
    }

    async fn find(
        &self,
        collection: &CollectionName,
        selector: &RecordSelector,
    ) -> Result<Vec<StoredRecord>> {
        let id = selector.id.map(|id| *id.as_uuid());
        let criteria = criteria(selector);
        let sql = format!(
            "SELECT id, data, created_at, updated_at FROM app_records \
             WHERE {SELECTOR_FILTER} ORDER BY created_at, id"
        );
        let rows = self
            .client
            .query(&sql, &[&collection.as_str(), &id, &criteria])
            .await?;
        rows.iter().map(stored_record_from_row).collect()
    }

    async fn replace(&self, collection: &CollectionName, id: RecordId, data: &Value) -> Result<u64> {
        self.client
            .execute(
                "UPDATE app_records SET data = $3, updated_at = NOW() \
                 WHERE collection = $1 AND id = $2",
                &[&collection.as_str(), id.as_uuid(), data],
            )
            .await
    }

    async fn delete(&self, collection: &CollectionName, selector: &RecordSelector) -> Result<u64> {
        let id = selector.id.map(|id| *id.as_uuid());
        let criteria = criteria(selector);
        let sql = format!("DELETE FROM app_records WHERE {SELECTOR_FILTER}");
        self.client
            .execute(&sql, &[&collection.as_str(), &id, &criteria])
            .await
    }
}
