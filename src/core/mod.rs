//! Core compliance logic for PhiGate.
//!
//! # Modules
//!
//! - [`router`] - Dual-store router: classify, encrypt, store, audit
//! - [`retention`] - Retention windows, deletion requests and scheduled purges
//! - [`runtime`] - Wires configuration into a router and an enforcer
//!
//! # Request Workflow
//!
//! 1. **Classify**: the collection is mapped to PHI or NON_PHI (unknown is PHI)
//! 2. **Dispatch**: one strategy per classification handles the operation
//! 3. **Encrypt/Decrypt** (PHI only): whole-record envelope under the current key
//! 4. **Store**: one parameterized statement against exactly one store
//! 5. **Audit**: one entry per call, success or failure
//!
//! # Example
//!
//! ```rust,no_run
//! use phigate::config::load_config;
//! use phigate::core::runtime::PhiGate;
//! use phigate::domain::{AccessContext, CrudOperation};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("phigate.toml")?;
//! let gate = PhiGate::from_config(&config).await?;
//!
//! let ctx = AccessContext::new("user-1", "self_access");
//! gate.router()
//!     .store(json!({"severity": 7}), "menopause_symptoms", CrudOperation::Create, &ctx)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod retention;
pub mod router;
pub mod runtime;
