//! Enforce command implementation
//!
//! Runs one retention pass, or keeps running passes on the configured
//! schedule until a shutdown signal arrives.

use crate::config::load_config;
use crate::core::retention::RetentionSummary;
use crate::core::runtime::PhiGate;
use crate::domain::PhiGateError;
use chrono::Utc;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the enforce command
#[derive(Args, Debug)]
pub struct EnforceArgs {
    /// Keep running passes at the configured interval
    #[arg(long)]
    pub daemon: bool,
}

impl EnforceArgs {
    /// Execute the enforce command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(daemon = self.daemon, "Starting enforce command");

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

        if self.daemon {
            let interval = config.retention.schedule_interval_seconds;
            println!("🔁 Enforcing retention every {interval}s (Ctrl+C to stop)");
            gate.scheduler().run(shutdown_signal).await;
            println!("✅ Retention scheduler stopped");
            return Ok(0);
        }

        println!("🧹 Running retention pass");
        match gate.enforcer().run_pass(Utc::now()).await {
            Ok(summary) => {
                print_summary(&summary);
                Ok(if summary.is_successful() { 0 } else { 5 })
            }
            Err(PhiGateError::EnforcementInProgress) => {
                println!("⚠️  A retention pass is already running");
                Ok(0)
            }
            Err(e) => {
                println!("❌ Retention pass failed");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }
}

fn print_summary(summary: &RetentionSummary) {
    println!();
    println!("📊 Retention Summary");
    println!("   Deletion requests processed: {}", summary.requests_processed);
    println!("   PHI records purged:          {}", summary.phi_purged);
    println!("   Audit entries purged:        {}", summary.audit_purged);
    println!("   Duration:                    {:.2}s", summary.duration.as_secs_f64());

    if summary.is_successful() {
        println!();
        println!("✅ Retention pass completed");
    } else {
        println!();
        println!("⚠️  Retention pass completed with errors:");
        for error in &summary.errors {
            println!("   - {}: {}", error.step, error.message);
        }
    }
}
