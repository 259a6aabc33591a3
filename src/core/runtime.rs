//! Runtime wiring
//!
//! Builds the classifier, encryption engine, stores, audit logger, router and
//! enforcer from a validated configuration.

use crate::adapters::database::{create_stores, Stores};
use crate::audit::AuditLogger;
use crate::classification::Classifier;
use crate::config::PhiGateConfig;
use crate::core::retention::{RetentionEnforcer, RetentionPolicy, RetentionScheduler};
use crate::core::router::Router;
use crate::crypto::{EncryptionEngine, IndexHasher, StaticKeyResolver};
use crate::domain::Result;
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;

/// A fully wired compliance core
pub struct PhiGate {
    stores: Stores,
    router: Arc<Router>,
    enforcer: Arc<RetentionEnforcer>,
    schedule_interval: Duration,
}

impl PhiGate {
    /// Wires everything from configuration
    ///
    /// Store pools connect lazily; call [`Stores::test_connections`] through
    /// [`stores`](Self::stores) to fail fast.
    pub async fn from_config(config: &PhiGateConfig) -> Result<Self> {
        let classifier = Arc::new(Classifier::from_config(&config.classification)?);
        let resolver = Arc::new(StaticKeyResolver::from_config(&config.encryption)?);
        let engine = Arc::new(EncryptionEngine::new(resolver));
        let hasher = IndexHasher::new(config.encryption.index_pepper.expose_secret().as_bytes())?;
        let policy = RetentionPolicy::from_config(&config.retention)?;

        let stores = create_stores(config).await?;
        let audit = AuditLogger::new(stores.audit_sink.clone(), hasher.clone());

        let router = Arc::new(Router::new(
            classifier,
            engine,
            hasher,
            stores.phi.clone(),
            stores.general.clone(),
            audit.clone(),
        ));
        let enforcer = Arc::new(RetentionEnforcer::new(stores.phi.clone(), audit, policy));

        tracing::info!(
            environment = ?config.environment,
            audit_sink = ?config.audit.sink,
            "PhiGate runtime initialized"
        );

        Ok(Self {
            stores,
            router,
            enforcer,
            schedule_interval: Duration::from_secs(config.retention.schedule_interval_seconds),
        })
    }

    /// Router for feature code
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Retention enforcer
    pub fn enforcer(&self) -> &Arc<RetentionEnforcer> {
        &self.enforcer
    }

    /// Underlying stores
    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Scheduler running the enforcer at the configured interval
    pub fn scheduler(&self) -> RetentionScheduler {
        RetentionScheduler::new(self.enforcer.clone(), self.schedule_interval)
    }
}
