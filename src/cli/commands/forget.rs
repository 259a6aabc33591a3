//! Forget command implementation
//!
//! Files a consent revocation or erasure request for a user. The PHI is
//! removed by a later retention pass.

use crate::config::load_config;
use crate::core::runtime::PhiGate;
use crate::domain::{AccessContext, DeletionReason};
use chrono::Utc;
use clap::Args;

/// Arguments for the forget command
#[derive(Args, Debug)]
pub struct ForgetArgs {
    /// User whose PHI should be deleted
    pub user_id: String,

    /// Reason (consent_revoked or erasure_request)
    #[arg(long, default_value = "consent_revoked")]
    pub reason: DeletionReason,

    /// Operator filing the request
    #[arg(long, env = "PHIGATE_OPERATOR", default_value = "operator")]
    pub actor: String,
}

impl ForgetArgs {
    /// Execute the forget command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let gate = match PhiGate::from_config(&config).await {
            Ok(g) => g,
            Err(e) => {
                println!("❌ Failed to initialize PhiGate");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        if let Err(e) = gate.stores().test_connections().await {
            println!("❌ Failed to connect to database");
            println!("   Error: {e}");
            return Ok(4);
        }

        let ctx = AccessContext::new(self.actor.as_str(), self.reason.as_str());
        match gate
            .enforcer()
            .file_deletion_request(&self.user_id, self.reason, &ctx, Utc::now())
            .await
        {
            Ok(request) => {
                println!("✅ Deletion request filed: {}", request.id);
                println!("   Reason: {}", request.reason);
                println!("   Effective at: {}", request.effective_at.to_rfc3339());
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to file deletion request");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }
}
