//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - Console output at a configurable level
//! - Optional JSON file logging with rotation
//!
//! Log events carry collection names, operations, record ids, hashes and
//! counts. Plaintext PHI, raw owner ids and key material are never logged.
//!
//! # Example
//!
//! ```no_run
//! use phigate::logging::init_logging;
//! use phigate::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a completed router call
///
/// # Example
///
/// ```no_run
/// use phigate::log_store_outcome;
/// use phigate::domain::{Classification, CrudOperation};
/// use std::time::Duration;
///
/// log_store_outcome!("mood_entries", CrudOperation::Create, Classification::Phi, 1u64, Duration::from_millis(4));
/// ```
#[macro_export]
macro_rules! log_store_outcome {
    ($collection:expr, $operation:expr, $classification:expr, $rows:expr, $duration:expr) => {
        tracing::info!(
            collection = %$collection,
            operation = %$operation,
            classification = %$classification,
            rows = $rows,
            duration_ms = $duration.as_millis(),
            "Store operation completed"
        );
    };
}

/// Log the result of one retention purge step
///
/// # Example
///
/// ```no_run
/// use phigate::log_purge_complete;
///
/// log_purge_complete!("phi_records", 12u64);
/// ```
#[macro_export]
macro_rules! log_purge_complete {
    ($table:expr, $removed:expr) => {
        tracing::info!(
            table = $table,
            removed = $removed,
            "Retention purge completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use phigate::log_error_with_context;
/// use phigate::domain::PhiGateError;
///
/// let error = PhiGateError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
