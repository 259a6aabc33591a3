//! PostgreSQL client implementation
//!
//! Pooled connections with a per-statement timeout and optional TLS.
//! Every statement is sent with bound parameters; SQL text never contains
//! caller data.

use crate::config::schema::PostgreSQLConfig;
use crate::domain::{PhiGateError, Result, StorageError};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

/// Schema of the compliance store (PHI rows, deletion requests, audit log)
pub const COMPLIANCE_SCHEMA: &str = include_str!("../../../migrations/001_compliance_schema.sql");

/// Schema of the general-purpose store
pub const GENERAL_SCHEMA: &str = include_str!("../../../migrations/002_general_schema.sql");

/// PostgreSQL client for PhiGate
///
/// One client per physical store. Cloning is not supported; share it
/// through an `Arc`.
pub struct PostgreSQLClient {
    /// Connection pool
    pool: Pool,

    /// Configuration
    config: PostgreSQLConfig,

    /// Store label used in logs ("compliance_store", "general_store")
    label: &'static str,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// The pool is created lazily; no connection is opened until the first
    /// statement or [`test_connection`](Self::test_connection).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid or the TLS
    /// connector cannot be built.
    pub fn new(config: PostgreSQLConfig, label: &'static str) -> Result<Self> {
        let mut pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .parse()
            .map_err(|e| {
                PhiGateError::Configuration(format!("{label}: invalid PostgreSQL connection string: {e}"))
            })?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = match config.ssl_mode.as_str() {
            "disable" => {
                pg_config.ssl_mode(SslMode::Disable);
                Manager::from_config(pg_config, NoTls, manager_config)
            }
            mode => {
                pg_config.ssl_mode(if mode == "prefer" {
                    SslMode::Prefer
                } else {
                    SslMode::Require
                });
                let connector = tls_connector(mode).map_err(|e| {
                    PhiGateError::Configuration(format!("{label}: failed to build TLS connector: {e}"))
                })?;
                Manager::from_config(pg_config, MakeTlsConnector::new(connector), manager_config)
            }
        };

        let timeout = Duration::from_secs(config.connection_timeout_seconds);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .map_err(|e| {
                StorageError::ConnectionFailed(format!("{label}: failed to create connection pool: {e}"))
            })?;

        Ok(Self {
            pool,
            config,
            label,
        })
    }

    /// Test the connection to PostgreSQL
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;
        client.query_one("SELECT 1", &[]).await.map_err(|e| {
            StorageError::ConnectionFailed(format!("{}: connection test failed: {e}", self.label))
        })?;

        tracing::info!(
            store = self.label,
            target = %self.connection_string_safe(),
            "PostgreSQL connection test successful"
        );
        Ok(())
    }

    /// Apply a schema script
    ///
    /// Scripts are idempotent (`CREATE ... IF NOT EXISTS`).
    pub async fn run_migrations(&self, sql: &str) -> Result<()> {
        let client = self.get_connection().await?;
        client.batch_execute(sql).await.map_err(|e| {
            StorageError::StatementFailed(format!("{}: failed to execute migration: {e}", self.label))
        })?;

        tracing::info!(store = self.label, "PostgreSQL schema initialized successfully");
        Ok(())
    }

    /// Get a connection from the pool
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if no connection can be obtained.
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        let client = self.pool.get().await.map_err(|e| {
            StorageError::Unavailable(format!("{}: failed to get connection from pool: {e}", self.label))
        })?;

        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client.batch_execute(&timeout_query).await.map_err(|e| {
            StorageError::Unavailable(format!("{}: failed to set statement timeout: {e}", self.label))
        })?;

        Ok(client)
    }

    /// Execute a query and return rows
    pub async fn query(&self, query: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        let client = self.get_connection().await?;
        client
            .query(query, params)
            .await
            .map_err(|e| StorageError::StatementFailed(format!("{}: query failed: {e}", self.label)).into())
    }

    /// Execute a statement and return the number of affected rows
    pub async fn execute(&self, statement: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64> {
        let client = self.get_connection().await?;
        client.execute(statement, params).await.map_err(|e| {
            StorageError::StatementFailed(format!("{}: statement failed: {e}", self.label)).into()
        })
    }

    /// Get the connection string (without credentials)
    pub fn connection_string_safe(&self) -> String {
        redact_connection_string(self.config.connection_string.expose_secret().as_ref())
    }

    /// Store label
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Get the pool statistics
    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}

fn tls_connector(ssl_mode: &str) -> std::result::Result<TlsConnector, native_tls::Error> {
    let mut builder = TlsConnector::builder();
    match ssl_mode {
        "verify-full" => {}
        "verify-ca" => {
            builder.danger_accept_invalid_hostnames(true);
        }
        // prefer / require: encrypt without certificate verification, like libpq
        _ => {
            builder.danger_accept_invalid_certs(true);
        }
    }
    builder.build()
}

fn redact_connection_string(conn_str: &str) -> String {
    conn_str
        .rsplit_once('@')
        .map(|(_, host)| format!("postgresql://***@{host}"))
        .unwrap_or_else(|| "postgresql://***".to_string())
}
