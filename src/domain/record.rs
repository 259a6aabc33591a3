//! Request and record types shared by the router and the stores
//!
//! Feature code hands the router a JSON value, a collection name, an
//! operation and an [`AccessContext`]. The types here give that JSON a shape:
//! records on create/update, selectors on read/delete.

use crate::domain::errors::PhiGateError;
use crate::domain::ids::RecordId;
use crate::domain::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Key holding the record id in records and selectors
pub const ID_FIELD: &str = "id";

/// Key holding the owning user in records and selectors
pub const OWNER_FIELD: &str = "user_id";

/// CRUD operation requested by feature code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrudOperation {
    /// Insert a new record
    Create,
    /// Select records matching a selector
    Read,
    /// Replace an existing record
    Update,
    /// Delete records matching a selector
    Delete,
}

impl CrudOperation {
    /// Whether the operation mutates the store
    pub fn is_mutation(&self) -> bool {
        !matches!(self, CrudOperation::Read)
    }
}

impl fmt::Display for CrudOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Read => write!(f, "read"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for CrudOperation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" | "insert" => Ok(Self::Create),
            "read" | "select" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(format!(
                "Invalid operation '{other}'. Must be one of: create, read, update, delete"
            )),
        }
    }
}

/// Caller context threaded into every audit entry
///
/// `authorized_purpose`, `minimum_necessary` and `consent_given` come from the
/// calling feature, never from defaults inside the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessContext {
    /// Acting user or service; only ever persisted as a keyed hash
    pub actor_id: String,

    /// Tenant the request belongs to, selects per-tenant classification
    pub tenant_id: Option<String>,

    /// Client IP address
    pub ip: Option<String>,

    /// Client user agent
    pub user_agent: Option<String>,

    /// Session identifier
    pub session_id: Option<String>,

    /// Purpose the caller is authorized for (e.g. "treatment", "self_access")
    pub authorized_purpose: String,

    /// Whether the caller limited the request to the minimum necessary data
    pub minimum_necessary: bool,

    /// Whether the data subject consented to this use
    pub consent_given: bool,
}

impl AccessContext {
    /// Creates a context for an actor and purpose
    pub fn new(actor_id: impl Into<String>, authorized_purpose: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            tenant_id: None,
            ip: None,
            user_agent: None,
            session_id: None,
            authorized_purpose: authorized_purpose.into(),
            minimum_necessary: true,
            consent_given: true,
        }
    }

    /// Context used by scheduled retention enforcement
    pub fn system() -> Self {
        Self::new(SYSTEM_ACTOR, "retention_enforcement")
    }

    /// Sets the tenant
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Sets the client IP address
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Sets the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the session id
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Sets the minimum-necessary flag
    pub fn with_minimum_necessary(mut self, minimum_necessary: bool) -> Self {
        self.minimum_necessary = minimum_necessary;
        self
    }

    /// Sets the consent flag
    pub fn with_consent(mut self, consent_given: bool) -> Self {
        self.consent_given = consent_given;
        self
    }

    /// Validates that actor and purpose are present
    pub fn validate(&self) -> Result<()> {
        if self.actor_id.trim().is_empty() {
            return Err(PhiGateError::Validation(
                "access context actor_id cannot be empty".to_string(),
            ));
        }
        if self.authorized_purpose.trim().is_empty() {
            return Err(PhiGateError::Validation(
                "access context authorized_purpose cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Actor recorded for scheduled enforcement passes
pub const SYSTEM_ACTOR: &str = "system";

/// Equality selector for read and delete requests
///
/// `id` and `user_id` are recognised keys; every other key is matched against
/// the collection's indexed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSelector {
    /// Record id
    pub id: Option<RecordId>,

    /// Owning user
    pub owner_id: Option<String>,

    /// Other equality constraints, rendered as strings
    pub fields: BTreeMap<String, String>,
}

impl RecordSelector {
    /// Selector matching a single record id
    pub fn by_id(id: RecordId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Selector matching every record of an owner
    pub fn by_owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Self::default()
        }
    }

    /// Parses a selector from the request payload
    ///
    /// `null` yields an empty selector. Nested objects and arrays are
    /// rejected since only equality on scalars is supported.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            _ => {
                return Err(PhiGateError::Validation(
                    "selector must be a JSON object".to_string(),
                ))
            }
        };

        let mut selector = Self::default();
        for (key, val) in map {
            match key.as_str() {
                ID_FIELD => {
                    let raw = scalar_to_string(key, val)?;
                    selector.id = Some(RecordId::from_str(&raw).map_err(PhiGateError::Validation)?);
                }
                OWNER_FIELD => selector.owner_id = Some(scalar_to_string(key, val)?),
                _ => {
                    selector
                        .fields
                        .insert(key.clone(), scalar_to_string(key, val)?);
                }
            }
        }
        Ok(selector)
    }

    /// Whether the selector matches everything
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.owner_id.is_none() && self.fields.is_empty()
    }

    /// Checks a plaintext record against the selector
    pub fn matches(&self, id: &RecordId, record: &Value) -> bool {
        if let Some(ref wanted) = self.id {
            if wanted != id {
                return false;
            }
        }
        if let Some(ref owner) = self.owner_id {
            match record.get(OWNER_FIELD).and_then(scalar_as_string) {
                Some(actual) if &actual == owner => {}
                _ => return false,
            }
        }
        self.fields.iter().all(|(key, wanted)| {
            record
                .get(key)
                .and_then(scalar_as_string)
                .map(|actual| &actual == wanted)
                .unwrap_or(false)
        })
    }

    /// Selector rendered as a JSON object, for audit criteria
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(ref id) = self.id {
            map.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        }
        if let Some(ref owner) = self.owner_id {
            map.insert(OWNER_FIELD.to_string(), Value::String(owner.clone()));
        }
        for (key, val) in &self.fields {
            map.insert(key.clone(), Value::String(val.clone()));
        }
        Value::Object(map)
    }
}

/// Renders a scalar JSON value as a string
///
/// Returns `None` for `null`, arrays and objects.
pub fn scalar_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar_to_string(key: &str, value: &Value) -> Result<String> {
    scalar_as_string(value).ok_or_else(|| {
        PhiGateError::Validation(format!("selector field '{key}' must be a scalar value"))
    })
}

/// A record as returned to feature code (always plaintext)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Record id
    pub id: RecordId,

    /// Record payload
    pub data: Value,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last replaced
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a routed store call
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome {
    /// A record was inserted
    Created {
        /// Id of the new record
        id: RecordId,
    },
    /// Records matching the selector
    Records(Vec<StoredRecord>),
    /// Rows replaced by an update
    Updated {
        /// Number of rows affected
        affected: u64,
    },
    /// Rows removed by a delete
    Deleted {
        /// Number of rows affected
        affected: u64,
    },
}

impl StoreOutcome {
    /// Number of rows touched or returned
    pub fn row_count(&self) -> u64 {
        match self {
            Self::Created { .. } => 1,
            Self::Records(records) => records.len() as u64,
            Self::Updated { affected } | Self::Deleted { affected } => *affected,
        }
    }
}
