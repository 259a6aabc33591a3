//! Audit entry and operation lifecycle types

use crate::domain::{AccessContext, Classification, CrudOperation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Operation recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOperation {
    /// Record created
    Insert,
    /// Records read
    Select,
    /// Record replaced
    Update,
    /// Records deleted
    Delete,
    /// Selection criteria captured ahead of an irreversible PHI delete
    PreDelete,
    /// Retention enforcement pass
    Cleanup,
}

impl AuditOperation {
    /// Canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Select => "SELECT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::PreDelete => "PRE_DELETE",
            Self::Cleanup => "CLEANUP",
        }
    }
}

impl From<CrudOperation> for AuditOperation {
    fn from(op: CrudOperation) -> Self {
        match op {
            CrudOperation::Create => Self::Insert,
            CrudOperation::Read => Self::Select,
            CrudOperation::Update => Self::Update,
            CrudOperation::Delete => Self::Delete,
        }
    }
}

impl fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INSERT" => Ok(Self::Insert),
            "SELECT" => Ok(Self::Select),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "PRE_DELETE" => Ok(Self::PreDelete),
            "CLEANUP" => Ok(Self::Cleanup),
            other => Err(format!("Unknown audit operation '{other}'")),
        }
    }
}

/// Lifecycle stage of a routed operation
///
/// `Requested -> Classified -> (Encrypted | Decrypted) -> (Stored | Retrieved)
/// -> Audited -> Complete`, with `Failed` reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStage {
    /// Call received
    Requested,
    /// Collection classified
    Classified,
    /// PHI envelope sealed
    Encrypted,
    /// PHI envelope opened
    Decrypted,
    /// Store mutation issued
    Stored,
    /// Store read issued
    Retrieved,
    /// Audit entry written
    Audited,
    /// Finished successfully
    Complete,
    /// Failed; the entry's error message names the failing stage
    Failed,
}

impl OperationStage {
    /// Whether `next` is a legal successor of this stage
    pub fn can_advance_to(self, next: OperationStage) -> bool {
        use OperationStage::*;
        match (self, next) {
            (Failed, _) | (Complete, _) => false,
            (_, Failed) => true,
            (Requested, Classified) => true,
            (Classified, Encrypted | Decrypted | Stored | Retrieved) => true,
            (Encrypted, Stored) => true,
            (Retrieved, Decrypted) => true,
            (Stored | Decrypted | Retrieved, Audited) => true,
            (Audited, Complete) => true,
            _ => false,
        }
    }

    /// Upper-case stage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Classified => "CLASSIFIED",
            Self::Encrypted => "ENCRYPTED",
            Self::Decrypted => "DECRYPTED",
            Self::Stored => "STORED",
            Self::Retrieved => "RETRIEVED",
            Self::Audited => "AUDITED",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for OperationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the stage of one routed operation
#[derive(Debug, Clone)]
pub struct StageTracker {
    current: OperationStage,
    last_active: OperationStage,
}

impl StageTracker {
    /// Starts at `Requested`
    pub fn new() -> Self {
        Self {
            current: OperationStage::Requested,
            last_active: OperationStage::Requested,
        }
    }

    /// Current stage
    pub fn current(&self) -> OperationStage {
        self.current
    }

    /// Moves to the next stage
    ///
    /// Illegal transitions are ignored and logged at debug level; the tracker
    /// only ever reports stages that were legally reached.
    pub fn advance(&mut self, next: OperationStage) {
        if self.current.can_advance_to(next) {
            self.current = next;
            if next != OperationStage::Failed {
                self.last_active = next;
            }
        } else {
            tracing::debug!(from = %self.current, to = %next, "Ignoring illegal stage transition");
        }
    }

    /// Marks the operation failed and renders the error message
    ///
    /// The message names the stage that was being attempted after the last
    /// stage reached, formatted `"<stage>: <error>"`.
    pub fn fail(&mut self, failing_stage: OperationStage, error: impl fmt::Display) -> String {
        self.advance(OperationStage::Failed);
        format!("{failing_stage}: {error}")
    }

    /// Last stage reached before failure (or the current stage)
    pub fn last_active(&self) -> OperationStage {
        self.last_active
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// One append-only audit record
///
/// Written once per attempted operation, success or failure, and never
/// updated. The acting user is stored only as a keyed hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry id
    pub id: Uuid,

    /// Keyed hash of the acting user or service
    pub actor_hash: String,

    /// Collection (or `phi_records` / `audit_log` for enforcement passes)
    pub table_name: String,

    /// Audited operation
    pub operation: AuditOperation,

    /// When the entry was created
    pub timestamp: DateTime<Utc>,

    /// Client IP address
    pub ip: Option<String>,

    /// Client user agent
    pub user_agent: Option<String>,

    /// Session identifier
    pub session_id: Option<String>,

    /// Whether the operation succeeded
    pub success: bool,

    /// `"<stage>: <error>"` when the operation failed
    pub error_message: Option<String>,

    /// Caller limited the request to the minimum necessary data
    pub minimum_necessary: bool,

    /// Purpose the caller is authorized for
    pub authorized_purpose: String,

    /// Data subject consented to this use
    pub consent_given: bool,

    /// Classification applied to the collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,

    /// Record addressed by the operation, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,

    /// Extra structured detail (hashed criteria, row counts); never plaintext PHI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AuditEntry {
    /// Creates a successful entry for a caller context
    pub fn new(
        actor_hash: impl Into<String>,
        ctx: &AccessContext,
        table_name: impl Into<String>,
        operation: AuditOperation,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_hash: actor_hash.into(),
            table_name: table_name.into(),
            operation,
            timestamp: Utc::now(),
            ip: ctx.ip.clone(),
            user_agent: ctx.user_agent.clone(),
            session_id: ctx.session_id.clone(),
            success: true,
            error_message: None,
            minimum_necessary: ctx.minimum_necessary,
            authorized_purpose: ctx.authorized_purpose.clone(),
            consent_given: ctx.consent_given,
            classification: None,
            record_id: None,
            details: None,
        }
    }

    /// Sets the classification
    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = Some(classification);
        self
    }

    /// Sets the addressed record
    pub fn with_record(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    /// Adds details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Marks as failed with error message
    pub fn failed(mut self, error_message: impl Into<String>) -> Self {
        self.success = false;
        self.error_message = Some(error_message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_names() {
        assert_eq!(AuditOperation::from(CrudOperation::Create), AuditOperation::Insert);
        assert_eq!(AuditOperation::from(CrudOperation::Read).as_str(), "SELECT");
        assert_eq!(
            serde_json::to_value(AuditOperation::PreDelete).unwrap(),
            json!("PRE_DELETE")
        );
        assert_eq!("CLEANUP".parse::<AuditOperation>().unwrap(), AuditOperation::Cleanup);
    }

    #[test]
    fn test_stage_happy_paths() {
        use OperationStage::*;
        for path in [
            vec![Requested, Classified, Encrypted, Stored, Audited, Complete],
            vec![Requested, Classified, Retrieved, Decrypted, Audited, Complete],
            vec![Requested, Classified, Stored, Audited, Complete],
        ] {
            for pair in path.windows(2) {
                assert!(pair[0].can_advance_to(pair[1]), "{} -> {}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn test_stage_illegal_transitions() {
        use OperationStage::*;
        assert!(!Requested.can_advance_to(Stored));
        assert!(!Complete.can_advance_to(Failed));
        assert!(!Failed.can_advance_to(Complete));
        assert!(Encrypted.can_advance_to(Failed));
    }

    #[test]
    fn test_tracker_failure_message() {
        let mut tracker = StageTracker::new();
        tracker.advance(OperationStage::Classified);
        tracker.advance(OperationStage::Encrypted);
        let message = tracker.fail(OperationStage::Stored, "Store unavailable: outage");

        assert_eq!(message, "STORED: Store unavailable: outage");
        assert_eq!(tracker.current(), OperationStage::Failed);
        assert_eq!(tracker.last_active(), OperationStage::Encrypted);
    }

    #[test]
    fn test_entry_copies_context() {
        let ctx = AccessContext::new("user-1", "treatment")
            .with_ip("10.1.1.1")
            .with_minimum_necessary(false);
        let entry = AuditEntry::new("abc123", &ctx, "mood_entries", AuditOperation::Insert)
            .with_classification(Classification::Phi)
            .failed("STORED: boom");

        assert_eq!(entry.actor_hash, "abc123");
        assert_eq!(entry.ip.as_deref(), Some("10.1.1.1"));
        assert_eq!(entry.authorized_purpose, "treatment");
        assert!(!entry.minimum_necessary);
        assert!(!entry.success);
        assert_eq!(entry.error_message.as_deref(), Some("STORED: boom"));
    }
}
