//! Retention windows

use crate::config::schema::{RetentionConfig, MIN_AUDIT_RETENTION_DAYS};
use crate::domain::{PhiGateError, Result};
use chrono::{DateTime, Duration, Utc};

/// Retention windows applied by the enforcer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Age after which PHI rows are hard-deleted
    pub phi_retention: Duration,

    /// Age after which audit entries may be purged
    pub audit_retention: Duration,

    /// Delay between consent revocation and deletion
    pub consent_grace: Duration,

    /// Maximum deletion requests handled per pass
    pub batch_limit: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            phi_retention: Duration::days(2555),
            audit_retention: Duration::days(i64::from(MIN_AUDIT_RETENTION_DAYS)),
            consent_grace: Duration::days(30),
            batch_limit: 1000,
        }
    }
}

impl RetentionPolicy {
    /// Builds the policy from the `[retention]` section
    ///
    /// # Errors
    ///
    /// Returns a configuration error if audit retention is shorter than ten
    /// years or than PHI retention.
    pub fn from_config(config: &RetentionConfig) -> Result<Self> {
        let policy = Self {
            phi_retention: Duration::days(i64::from(config.phi_retention_days)),
            audit_retention: Duration::days(i64::from(config.audit_retention_days)),
            consent_grace: Duration::days(i64::from(config.consent_grace_days)),
            batch_limit: config.batch_limit,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Checks the audit window outlives the PHI it describes
    pub fn validate(&self) -> Result<()> {
        if self.audit_retention < Duration::days(i64::from(MIN_AUDIT_RETENTION_DAYS)) {
            return Err(PhiGateError::Configuration(format!(
                "audit retention must be at least {MIN_AUDIT_RETENTION_DAYS} days"
            )));
        }
        if self.audit_retention < self.phi_retention {
            return Err(PhiGateError::Configuration(
                "audit retention must not be shorter than PHI retention".to_string(),
            ));
        }
        if self.batch_limit == 0 {
            return Err(PhiGateError::Configuration(
                "retention batch_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// PHI rows created before this instant are expired
    pub fn phi_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.phi_retention
    }

    /// Audit entries written before this instant are expired
    pub fn audit_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.audit_retention
    }
}
