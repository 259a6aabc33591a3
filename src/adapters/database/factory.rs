//! Store factory
//!
//! Builds the two physical stores and the audit sink from configuration.
//! The compliance client is shared between the PHI store and the PostgreSQL
//! audit sink so both use the same pool.

use crate::adapters::database::traits::{GeneralStore, PhiStore};
use crate::adapters::postgresql::{
    PostgresAuditSink, PostgresGeneralStore, PostgresPhiStore, PostgreSQLClient, COMPLIANCE_SCHEMA,
    GENERAL_SCHEMA,
};
use crate::audit::{AuditSink, FileAuditSink, MemoryAuditSink};
use crate::config::schema::{AuditSinkKind, PhiGateConfig};
use crate::domain::{PhiGateError, Result};
use std::sync::Arc;

/// Store handles built from configuration
pub struct Stores {
    /// Client for the compliance database
    pub compliance_client: Arc<PostgreSQLClient>,

    /// Client for the general-purpose database
    pub general_client: Arc<PostgreSQLClient>,

    /// PHI envelope store
    pub phi: Arc<dyn PhiStore>,

    /// NON_PHI record store
    pub general: Arc<dyn GeneralStore>,

    /// Audit sink selected by `[audit].sink`
    pub audit_sink: Arc<dyn AuditSink>,
}

impl Stores {
    /// Applies both schemas
    ///
    /// The audit log lives in the compliance schema, so it is created
    /// regardless of the configured sink.
    pub async fn migrate(&self) -> Result<()> {
        self.compliance_client.run_migrations(COMPLIANCE_SCHEMA).await?;
        self.general_client.run_migrations(GENERAL_SCHEMA).await?;
        Ok(())
    }

    /// Tests connectivity to both stores
    pub async fn test_connections(&self) -> Result<()> {
        self.phi.test_connection().await?;
        self.general.test_connection().await?;
        Ok(())
    }
}

/// Create both stores and the audit sink
///
/// # Errors
///
/// Returns an error if a connection string is invalid or the file audit sink
/// cannot be opened. No connection is opened here; pools connect lazily.
pub async fn create_stores(config: &PhiGateConfig) -> Result<Stores> {
    tracing::info!("Creating PostgreSQL clients for compliance and general stores");
    let compliance_client = Arc::new(PostgreSQLClient::new(
        config.compliance_store.clone(),
        "compliance_store",
    )?);
    let general_client = Arc::new(PostgreSQLClient::new(
        config.general_store.clone(),
        "general_store",
    )?);

    let audit_sink = create_audit_sink(config, compliance_client.clone()).await?;

    Ok(Stores {
        phi: Arc::new(PostgresPhiStore::new(compliance_client.clone())),
        general: Arc::new(PostgresGeneralStore::new(general_client.clone())),
        compliance_client,
        general_client,
        audit_sink,
    })
}

/// Create the audit sink selected by `[audit].sink`
pub async fn create_audit_sink(
    config: &PhiGateConfig,
    compliance_client: Arc<PostgreSQLClient>,
) -> Result<Arc<dyn AuditSink>> {
    match config.audit.sink {
        AuditSinkKind::PostgreSQL => {
            tracing::info!("Using PostgreSQL audit sink");
            Ok(Arc::new(PostgresAuditSink::new(compliance_client)))
        }
        AuditSinkKind::File => {
            let path = config.audit.file_path.as_deref().ok_or_else(|| {
                PhiGateError::Configuration("audit.file_path is required for the file sink".to_string())
            })?;
            tracing::info!(path = %path, "Using file audit sink");
            Ok(Arc::new(FileAuditSink::new(path).await?))
        }
        AuditSinkKind::Memory => {
            tracing::warn!("Using in-memory audit sink; entries are lost on exit");
            Ok(Arc::new(MemoryAuditSink::new()))
        }
    }
}
