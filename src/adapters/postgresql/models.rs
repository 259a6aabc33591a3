//! Row mapping for the PostgreSQL stores
//!
//! Converts `tokio_postgres::Row`s into domain values. Any missing column or
//! unexpected shape is an [`StorageError::InvalidRow`].

use crate::adapters::database::traits::PhiRow;
use crate::audit::{AuditEntry, AuditOperation};
use crate::crypto::EncryptedPayload;
use crate::domain::{
    Classification, CollectionName, DeletionRequest, KeyVersion, RecordId, Result, StorageError,
    StoredRecord,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio_postgres::Row;
use uuid::Uuid;

/// Columns selected for PHI rows, in [`phi_row_from_row`] order
pub const PHI_COLUMNS: &str =
    "collection, id, owner_hash, ciphertext, iv, auth_tag, key_version, index_hashes, created_at, updated_at";

/// Columns selected for deletion requests
pub const DELETION_REQUEST_COLUMNS: &str =
    "id, owner_hash, reason, requested_at, effective_at, processed_at";

/// Columns selected for audit entries
pub const AUDIT_COLUMNS: &str = "id, actor_hash, table_name, operation, occurred_at, ip, user_agent, \
     session_id, success, error_message, minimum_necessary, authorized_purpose, consent_given, \
     classification, record_id, details";

fn column<'a, T>(row: &'a Row, name: &str) -> Result<T>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(name)
        .map_err(|e| StorageError::InvalidRow(format!("column '{name}': {e}")).into())
}

/// Maps a `phi_records` row
pub fn phi_row_from_row(row: &Row) -> Result<PhiRow> {
    let collection: String = column(row, "collection")?;
    let key_version: String = column(row, "key_version")?;
    let index_hashes: Value = column(row, "index_hashes")?;

    Ok(PhiRow {
        collection: CollectionName::new(collection).map_err(StorageError::InvalidRow)?,
        id: RecordId::from_uuid(column(row, "id")?),
        owner_hash: column(row, "owner_hash")?,
        payload: EncryptedPayload {
            ciphertext: column(row, "ciphertext")?,
            iv: column(row, "iv")?,
            auth_tag: column(row, "auth_tag")?,
            key_version: KeyVersion::new(key_version).map_err(StorageError::InvalidRow)?,
        },
        index_hashes: serde_json::from_value::<BTreeMap<String, String>>(index_hashes)
            .map_err(|e| StorageError::InvalidRow(format!("index_hashes: {e}")))?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

/// Maps a `deletion_requests` row
pub fn deletion_request_from_row(row: &Row) -> Result<DeletionRequest> {
    let reason: String = column(row, "reason")?;
    Ok(DeletionRequest {
        id: column(row, "id")?,
        owner_hash: column(row, "owner_hash")?,
        reason: reason.parse().map_err(StorageError::InvalidRow)?,
        requested_at: column(row, "requested_at")?,
        effective_at: column(row, "effective_at")?,
        processed_at: column::<Option<DateTime<Utc>>>(row, "processed_at")?,
    })
}

/// Maps an `app_records` row
pub fn stored_record_from_row(row: &Row) -> Result<StoredRecord> {
    Ok(StoredRecord {
        id: RecordId::from_uuid(column::<Uuid>(row, "id")?),
        data: column(row, "data")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

/// Maps an `audit_log` row
pub fn audit_entry_from_row(row: &Row) -> Result<AuditEntry> {
    let operation: String = column(row, "operation")?;
    let classification: Option<String> = column(row, "classification")?;

    Ok(AuditEntry {
        id: column(row, "id")?,
        actor_hash: column(row, "actor_hash")?,
        table_name: column(row, "table_name")?,
        operation: operation
            .parse::<AuditOperation>()
            .map_err(StorageError::InvalidRow)?,
        timestamp: column(row, "occurred_at")?,
        ip: column(row, "ip")?,
        user_agent: column(row, "user_agent")?,
        session_id: column(row, "session_id")?,
        success: column(row, "success")?,
        error_message: column(row, "error_message")?,
        minimum_necessary: column(row, "minimum_necessary")?,
        authorized_purpose: column(row, "authorized_purpose")?,
        consent_given: column(row, "consent_given")?,
        classification: classification
            .as_deref()
            .map(parse_classification)
            .transpose()?,
        record_id: column(row, "record_id")?,
        details: column(row, "details")?,
    })
}

fn parse_classification(value: &str) -> Result<Classification> {
    match value {
        "PHI" => Ok(Classification::Phi),
        "NON_PHI" => Ok(Classification::NonPhi),
        other => Err(StorageError::InvalidRow(format!("unknown classification '{other}'")).into()),
    }
}
