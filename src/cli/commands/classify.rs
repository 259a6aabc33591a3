//! Classify command implementation
//!
//! Shows how a collection would be routed, without touching any store.

use crate::classification::Classifier;
use crate::config::load_config;
use crate::domain::CollectionName;
use clap::Args;

/// Arguments for the classify command
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Collection name to classify
    pub collection: String,

    /// Classify with a tenant's override applied
    #[arg(long)]
    pub tenant: Option<String>,
}

impl ClassifyArgs {
    /// Execute the classify command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let classifier = match Classifier::from_config(&config.classification) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Invalid classification configuration");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let result = classifier.classify_for(self.tenant.as_deref(), &self.collection);
        println!("{}: {}", self.collection, result.classification);

        if let Some(ref warning) = result.warning {
            tracing::warn!(collection = %warning.collection, "Collection is not allow-listed");
            println!("⚠️  {warning}");
        }

        if let Ok(name) = CollectionName::new(self.collection.as_str()) {
            let fields = classifier
                .policy_for(self.tenant.as_deref())
                .indexed_fields(&name);
            if !fields.is_empty() {
                println!("   Indexed fields: {}", fields.join(", "));
            }
        } else {
            println!("⚠️  '{}' is not a valid collection name and will be rejected", self.collection);
        }

        Ok(0)
    }
}
