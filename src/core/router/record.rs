//! Record shaping shared by both strategies

use crate::domain::record::{scalar_as_string, ID_FIELD, OWNER_FIELD};
use crate::domain::{AccessContext, PhiGateError, RecordId, Result};
use serde_json::Value;
use std::str::FromStr;

/// Splits a create/update payload into its id and the record to persist
///
/// The returned record always carries its id under `"id"`. A missing id is
/// generated unless `require_id` is set.
pub fn prepare_record(data: Value, require_id: bool) -> Result<(RecordId, Value)> {
    let mut map = match data {
        Value::Object(map) => map,
        _ => {
            return Err(PhiGateError::Validation(
                "record must be a JSON object".to_string(),
            ))
        }
    };

    let id = match map.get(ID_FIELD) {
        Some(raw) => {
            let raw = scalar_as_string(raw).ok_or_else(|| {
                PhiGateError::Validation("record 'id' must be a scalar value".to_string())
            })?;
            RecordId::from_str(&raw).map_err(PhiGateError::Validation)?
        }
        None if require_id => {
            return Err(PhiGateError::Validation(
                "update requires an 'id' field".to_string(),
            ))
        }
        None => RecordId::generate(),
    };

    map.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    Ok((id, Value::Object(map)))
}

/// Owner named by the record itself, if any
pub fn explicit_owner(record: &Value) -> Option<String> {
    record.get(OWNER_FIELD).and_then(scalar_as_string)
}

/// Owner of a record: its `user_id`, else the acting user
pub fn owner_of(record: &Value, ctx: &AccessContext) -> String {
    explicit_owner(record).unwrap_or_else(|| ctx.actor_id.clone())
}
