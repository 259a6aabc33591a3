//! JSON-lines audit sink
//!
//! One entry per line, appended. Retention purges rewrite the file through a
//! temporary sibling and an atomic rename so a crash never leaves a truncated
//! trail.

use super::entry::AuditEntry;
use super::sink::AuditSink;
use crate::domain::AuditWriteError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Append-only JSON-lines audit file
#[derive(Debug)]
pub struct FileAuditSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileAuditSink {
    /// Opens (or prepares to create) the audit file
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self, AuditWriteError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    AuditWriteError::Unavailable(format!(
                        "Failed to create audit log directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the audit file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<AuditEntry>, AuditWriteError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AuditWriteError::Unavailable(format!(
                    "Failed to read audit log {}: {e}",
                    self.path.display()
                )))
            }
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| {
                    AuditWriteError::Serialization(format!("Corrupt audit log line: {e}"))
                })
            })
            .collect()
    }
}

#[async_trait]
impl AuditSink for FileAuditSink {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditWriteError> {
        let mut line =
            serde_json::to_string(entry).map_err(|e| AuditWriteError::Serialization(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                AuditWriteError::Unavailable(format!(
                    "Failed to open audit log {}: {e}",
                    self.path.display()
                ))
            })?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| AuditWriteError::WriteFailed(e.to_string()))?;
        file.sync_data()
            .await
            .map_err(|e| AuditWriteError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AuditWriteError> {
        let _guard = self.write_lock.lock().await;
        let entries = self.read_all().await?;
        let before = entries.len();

        let mut kept = String::new();
        for entry in entries.iter().filter(|e| e.timestamp >= cutoff) {
            let line = serde_json::to_string(entry)
                .map_err(|e| AuditWriteError::Serialization(e.to_string()))?;
            kept.push_str(&line);
            kept.push('\n');
        }
        let removed = before - kept.lines().count();
        if removed == 0 {
            return Ok(0);
        }

        let tmp = self.path.with_extension("purge.tmp");
        fs::write(&tmp, kept.as_bytes())
            .await
            .map_err(|e| AuditWriteError::WriteFailed(e.to_string()))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AuditWriteError::WriteFailed(e.to_string()))?;

        Ok(removed as u64)
    }

    async fn entries(&self, table_name: Option<&str>) -> Result<Vec<AuditEntry>, AuditWriteError> {
        let entries = self.read_all().await?;
        Ok(entries
            .into_iter()
            .filter(|e| table_name.map(|t| e.table_name == t).unwrap_or(true))
            .collect())
    }
}
