//! PostgreSQL compliance store
//!
//! All PHI collections share one `phi_records` table keyed by
//! `(collection, id)`. Lookups run against the hashed columns only.

use super::client::PostgreSQLClient;
use super::models::{deletion_request_from_row, phi_row_from_row, DELETION_REQUEST_COLUMNS, PHI_COLUMNS};
use crate::adapters::database::traits::{PhiQuery, PhiRow, PhiStore};
use crate::domain::{CollectionName, DeletionRequest, PhiGateError, Result, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

const QUERY_FILTER: &str = "collection = $1 \
     AND ($2::uuid IS NULL OR id = $2) \
     AND ($3::text IS NULL OR owner_hash = $3) \
     AND index_hashes @> $4::jsonb";

/// Compliance store backed by PostgreSQL
pub struct PostgresPhiStore {
    client: Arc<PostgreSQLClient>,
}

impl PostgresPhiStore {
    /// Wraps a client connected to the compliance database
    pub fn new(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }
}

fn hashes_json(hashes: &std::collections::BTreeMap<String, String>) -> Result<Value> {
    serde_json::to_value(hashes).map_err(|e| PhiGateError::Serialization(e.to_string()))
}

#[async_trait]
impl PhiStore for PostgresPhiStore {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn insert(&self, row: &PhiRow) -> Result<()> {
        let index_hashes = hashes_json(&row.index_hashes)?;
        self.client
            .execute(
                "INSERT INTO phi_records \
                 (collection, id, owner_hash, ciphertext, iv, auth_tag, key_version, index_hashes, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
                &[
                    &row.collection.as_str(),
                    row.id.as_uuid(),
                    &row.owner_hash,
                    &row.payload.ciphertext,
                    &row.payload.iv,
                    &row.payload.auth_tag,
                    &row.payload.key_version.as_str(),
                    &index_hashes,
                    &row.created_at,
                    &row.updated_at,
                ],
            )
            .await?;
        Ok(())
    }

    async fn find(&self, collection: &CollectionName, query: &PhiQuery) -> Result<Vec<PhiRow>> {
        let id = query.id.map(|id| *id.as_uuid());
        let index_hashes = hashes_json(&query.index_hashes)?;
        let sql = format!(
            "SELECT {PHI_COLUMNS} FROM phi_records WHERE {QUERY_FILTER} ORDER BY created_at, id"
        );
        let rows = self
            .client
            .query(
                &sql,
                &[&collection.as_str(), &id, &query.owner_hash, &index_hashes],
            )
            .await?;
        rows.iter().map(phi_row_from_row).collect()
    }

    async fn replace(&self, row: &PhiRow, reassign_owner: bool) -> Result<u64> {
        let index_hashes = hashes_json(&row.index_hashes)?;
        self.client
            .execute(
                "UPDATE phi_records SET \
                 owner_hash = CASE WHEN $10 THEN $3 ELSE owner_hash END, \
                 ciphertext = $4, iv = $5, auth_tag = $6, \
                 key_version = $7, index_hashes = $8, updated_at = $9 \
                 WHERE collection = $1 AND id = $2",
                &[
                    &row.collection.as_str(),
                    row.id.as_uuid(),
                    &row.owner_hash,
                    &row.payload.ciphertext,
                    &row.payload.iv,
                    &row.payload.auth_tag,
                    &row.payload.key_version.as_str(),
                    &index_hashes,
                    &row.updated_at,
                    &reassign_owner,
                ],
            )
            .await
    }

    async fn delete(&self, collection: &CollectionName, query: &PhiQuery) -> Result<u64> {
        let id = query.id.map(|id| *id.as_uuid());
        let index_hashes = hashes_json(&query.index_hashes)?;
        let sql = format!("DELETE FROM phi_records WHERE {QUERY_FILTER}");
        self.client
            .execute(
                &sql,
                &[&collection.as_str(), &id, &query.owner_hash, &index_hashes],
            )
            .await
    }

    async fn delete_by_owner(&self, owner_hash: &str) -> Result<u64> {
        self.client
            .execute("DELETE FROM phi_records WHERE owner_hash = $1", &[&owner_hash])
            .await
    }

    async fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.client
            .execute("DELETE FROM phi_records WHERE created_at < $1", &[&cutoff])
            .await
    }

    async fn insert_deletion_request(&self, request: &DeletionRequest) -> Result<()> {
        self.client
            .execute(
                "INSERT INTO deletion_requests \
                 (id, owner_hash, reason, requested_at, effective_at, processed_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    &request.id,
                    &request.owner_hash,
                    &request.reason.as_str(),
                    &request.requested_at,
                    &request.effective_at,
                    &request.processed_at,
                ],
            )
            .await?;
        Ok(())
    }

    async fn due_deletion_requests(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<DeletionRequest>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql = format!(
            "SELECT {DELETION_REQUEST_COLUMNS} FROM deletion_requests \
             WHERE processed_at IS NULL AND effective_at <= $1 \
             ORDER BY effective_at LIMIT $2"
        );
        let rows = self.client.query(&sql, &[&now, &limit]).await?;
        rows.iter().map(deletion_request_from_row).collect()
    }

    async fn mark_deletion_processed(&self, id: Uuid, processed_at: DateTime<Utc>) -> Result<()> {
        let affected = self
            .client
            .execute(
                "UPDATE deletion_requests SET processed_at = $2 WHERE id = $1 AND processed_at IS NULL",
                &[&id, &processed_at],
            )
            .await?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!("pending deletion request {id}")).into());
        }
        Ok(())
    }
}
