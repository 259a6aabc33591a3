// PhiGate - PHI compliance core
// Copyright (c) 2025 PhiGate Contributors
// Licensed under the MIT License

//! # PhiGate - PHI compliance core
//!
//! PhiGate sits between a health platform's feature code and its databases.
//! Every read and write names a logical collection; PhiGate decides whether
//! that collection holds protected health information and routes it
//! accordingly.
//!
//! ## Overview
//!
//! This library provides:
//! - **Classification** of collections as PHI or NON_PHI (unknown defaults to PHI)
//! - **Envelope encryption** of PHI records with AES-256-GCM and versioned keys
//! - **Dual-store routing**: encrypted PHI to the compliance store, plaintext
//!   NON_PHI to the general store
//! - **Audit logging** of every operation, success or failure
//! - **Retention enforcement**: time-based purges, consent revocation and
//!   erasure requests
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Router, retention enforcer and runtime wiring
//! - [`classification`] - Collection allow-lists and the classifier
//! - [`crypto`] - Encryption engine, key resolution and keyed hashing
//! - [`audit`] - Audit entries, sinks and the audit logger
//! - [`adapters`] - PostgreSQL and in-memory stores
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use phigate::config::load_config;
//! use phigate::core::runtime::PhiGate;
//! use phigate::domain::{AccessContext, CrudOperation};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("phigate.toml")?;
//!     let gate = PhiGate::from_config(&config).await?;
//!
//!     let ctx = AccessContext::new("user-42", "self_access");
//!     let outcome = gate
//!         .router()
//!         .store(
//!             json!({"user_id": "user-42", "severity": 6, "notes": "hot flashes"}),
//!             "menopause_symptoms",
//!             CrudOperation::Create,
//!             &ctx,
//!         )
//!         .await?;
//!
//!     println!("Stored: {outcome:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`], whose error type is
//! [`domain::PhiGateError`]. Error messages never carry plaintext PHI.

pub mod adapters;
pub mod audit;
pub mod classification;
pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod domain;
pub mod logging;
