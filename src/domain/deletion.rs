//! Deletion requests
//!
//! A request names a data subject (by owner hash) whose PHI must be removed
//! once `effective_at` has passed. Consent revocations carry a grace period;
//! erasure requests are effective immediately.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Why a subject's PHI is being deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionReason {
    /// Subject revoked consent; deletion after the grace period
    ConsentRevoked,
    /// Subject requested erasure; deletion at the next pass
    ErasureRequest,
}

impl DeletionReason {
    /// Snake-case name, as persisted
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConsentRevoked => "consent_revoked",
            Self::ErasureRequest => "erasure_request",
        }
    }
}

impl fmt::Display for DeletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeletionReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consent_revoked" => Ok(Self::ConsentRevoked),
            "erasure_request" => Ok(Self::ErasureRequest),
            other => Err(format!("Unknown deletion reason '{other}'")),
        }
    }
}

/// Pending or processed deletion of one subject's PHI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionRequest {
    /// Request id
    pub id: Uuid,

    /// Keyed hash of the subject's owner id
    pub owner_hash: String,

    /// Why the data is being deleted
    pub reason: DeletionReason,

    /// When the request was filed
    pub requested_at: DateTime<Utc>,

    /// Earliest time the data may be deleted
    pub effective_at: DateTime<Utc>,

    /// When the enforcer processed the request
    pub processed_at: Option<DateTime<Utc>>,
}

impl DeletionRequest {
    /// Creates a request filed at `requested_at`
    ///
    /// Consent revocations become effective after `grace`; erasure requests
    /// immediately.
    pub fn new(
        owner_hash: impl Into<String>,
        reason: DeletionReason,
        requested_at: DateTime<Utc>,
        grace: Duration,
    ) -> Self {
        let effective_at = match reason {
            DeletionReason::ConsentRevoked => requested_at + grace,
            DeletionReason::ErasureRequest => requested_at,
        };
        Self {
            id: Uuid::new_v4(),
            owner_hash: owner_hash.into(),
            reason,
            requested_at,
            effective_at,
            processed_at: None,
        }
    }

    /// Whether the request should be processed at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.processed_at.is_none() && self.effective_at <= now
    }
}
