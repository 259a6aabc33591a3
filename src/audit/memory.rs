//! In-memory audit sink for tests and local development

use super::entry::AuditEntry;
use super::sink::AuditSink;
use crate::domain::AuditWriteError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Audit sink backed by a `Vec`
///
/// [`set_available`](Self::set_available) simulates a sink outage.
#[derive(Debug)]
pub struct MemoryAuditSink {
    entries: RwLock<Vec<AuditEntry>>,
    available: AtomicBool,
}

impl MemoryAuditSink {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Toggles availability
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the sink holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), AuditWriteError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuditWriteError::Unavailable("memory audit sink offline".to_string()))
        }
    }
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditWriteError> {
        self.check_available()?;
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AuditWriteError> {
        self.check_available()?;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.timestamp >= cutoff);
        Ok((before - entries.len()) as u64)
    }

    async fn entries(&self, table_name: Option<&str>) -> Result<Vec<AuditEntry>, AuditWriteError> {
        self.check_available()?;
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| table_name.map(|t| e.table_name == t).unwrap_or(true))
            .cloned()
            .collect())
    }
}
