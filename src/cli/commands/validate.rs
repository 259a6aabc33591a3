//! Validate config command implementation
//!
//! Loads and validates the configuration, then builds the classifier, key
//! table and retention policy exactly as the runtime would.

use crate::classification::Classifier;
use crate::config::load_config;
use crate::core::retention::RetentionPolicy;
use crate::crypto::StaticKeyResolver;
use crate::domain::Result;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded and validated");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let built: Result<(Classifier, StaticKeyResolver, RetentionPolicy)> = (|| {
            Ok((
                Classifier::from_config(&config.classification)?,
                StaticKeyResolver::from_config(&config.encryption)?,
                RetentionPolicy::from_config(&config.retention)?,
            ))
        })();

        let (classifier, resolver, _) = match built {
            Ok(parts) => parts,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let policy = classifier.policy();
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  PHI Collections: {}", policy.phi_collections().count());
        println!("  NON_PHI Collections: {}", policy.non_phi_collections().count());
        println!("  Tenant Overrides: {}", config.classification.tenants.len());
        println!(
            "  Key Versions: {} (current: {})",
            resolver.len(),
            config.encryption.current_key_version
        );
        println!(
            "  Compliance Store: {}",
            redacted_target(config.compliance_store.connection_string.expose_secret().as_str())
        );
        println!(
            "  General Store: {}",
            redacted_target(config.general_store.connection_string.expose_secret().as_str())
        );
        println!("  Audit Sink: {:?}", config.audit.sink);
        println!(
            "  Retention: PHI {} days, audit {} days, consent grace {} days",
            config.retention.phi_retention_days,
            config.retention.audit_retention_days,
            config.retention.consent_grace_days
        );
        println!();
        Ok(0)
    }
}

fn redacted_target(connection_string: &str) -> &str {
    connection_string
        .rsplit_once('@')
        .map(|(_, host)| host)
        .unwrap_or("***")
}
