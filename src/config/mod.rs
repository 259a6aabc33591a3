//! Configuration management for PhiGate.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! PhiGate uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `PHIGATE_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation of every section plus cross-section rules
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use phigate::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("phigate.toml")?;
//!
//! println!("Current key version: {}", config.encryption.current_key_version);
//! println!("PHI retention: {} days", config.retention.phi_retention_days);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`ClassificationConfig`] - PHI / NON_PHI allow-lists, indexed fields, tenants
//! - [`EncryptionConfig`] - Key table and index pepper
//! - [`PostgreSQLConfig`] - `compliance_store` and `general_store`
//! - [`AuditConfig`] - Audit sink
//! - [`RetentionConfig`] - Retention windows and schedule
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//!
//! [classification]
//! phi_collections = ["menopause_symptoms", "therapy_notes"]
//! non_phi_collections = ["usage_tracking"]
//!
//! [classification.indexed_fields]
//! menopause_symptoms = ["logged_on"]
//!
//! [encryption]
//! current_key_version = "2025-06"
//! index_pepper = "${PHIGATE_INDEX_PEPPER}"
//!
//! [encryption.keys]
//! "2025-01" = "${PHIGATE_KEY_2025_01}"
//! "2025-06" = "${PHIGATE_KEY_2025_06}"
//!
//! [compliance_store]
//! connection_string = "${PHIGATE_COMPLIANCE_DB_URL}"
//! ssl_mode = "verify-full"
//!
//! [general_store]
//! connection_string = "${PHIGATE_GENERAL_DB_URL}"
//!
//! [audit]
//! sink = "postgresql"
//!
//! [retention]
//! phi_retention_days = 2555
//! audit_retention_days = 3650
//! consent_grace_days = 30
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, AuditConfig, AuditSinkKind, ClassificationConfig, EncryptionConfig,
    Environment, LoggingConfig, PhiGateConfig, PostgreSQLConfig, RetentionConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
