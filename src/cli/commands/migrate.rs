//! Migrate command implementation
//!
//! Applies the embedded schemas to the compliance and general stores.

use crate::adapters::database::create_stores;
use crate::config::load_config;
use clap::Args;

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Only test connectivity, do not apply schemas
    #[arg(long)]
    pub check: bool,
}

impl MigrateArgs {
    /// Execute the migrate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(check = self.check, "Running schema migration");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let stores = match create_stores(&config).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to create store clients");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        if let Err(e) = stores.test_connections().await {
            println!("❌ Failed to connect to database");
            println!("   Error: {e}");
            return Ok(4);
        }
        println!(
            "✅ Connected to {} and {}",
            stores.compliance_client.connection_string_safe(),
            stores.general_client.connection_string_safe()
        );

        if self.check {
            return Ok(0);
        }

        match stores.migrate().await {
            Ok(()) => {
                println!("✅ Schemas applied");
                Ok(0)
            }
            Err(e) => {
                println!("❌ Migration failed");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }
}
