//! Retention pass summary

use crate::domain::PhiGateError;
use std::time::Duration;

/// One step error of a retention pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepError {
    /// Step that failed (`deletion_requests`, `phi_records`, `audit_log`)
    pub step: String,

    /// Rendered error
    pub message: String,
}

/// Result of a full retention pass
#[derive(Debug, Clone, Default)]
pub struct RetentionSummary {
    /// Deletion requests processed
    pub requests_processed: usize,

    /// PHI rows removed by the retention window
    pub phi_purged: u64,

    /// Audit entries removed by the audit window
    pub audit_purged: u64,

    /// Step errors; later steps still ran
    pub errors: Vec<StepError>,

    /// Duration of the pass
    pub duration: Duration,
}

impl RetentionSummary {
    /// Create a new empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add a step error
    pub fn add_error(&mut self, step: &str, error: &PhiGateError) {
        self.errors.push(StepError {
            step: step.to_string(),
            message: error.to_string(),
        });
    }

    /// Whether every step succeeded
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }
}
