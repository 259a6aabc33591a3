//! Retention and deletion enforcement
//!
//! - [`RetentionPolicy`] - retention windows (PHI 7 years, audit 10 years)
//! - [`RetentionEnforcer`] - single-flight purge passes and deletion requests
//! - [`RetentionScheduler`] - runs passes on an interval until shutdown
//!
//! PHI purges never touch the audit trail; audit entries are purged only by
//! their own window, which is validated to outlive the PHI window.

pub mod enforcer;
pub mod policy;
pub mod scheduler;
pub mod summary;

pub use enforcer::{RetentionEnforcer, AUDIT_TABLE, DELETION_REQUESTS_TABLE, PHI_TABLE};
pub use policy::RetentionPolicy;
pub use scheduler::RetentionScheduler;
pub use summary::{RetentionSummary, StepError};
