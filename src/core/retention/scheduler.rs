//! Periodic retention passes

use super::enforcer::RetentionEnforcer;
use crate::domain::PhiGateError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Runs a retention pass on a fixed interval until shutdown
pub struct RetentionScheduler {
    enforcer: Arc<RetentionEnforcer>,
    interval: Duration,
}

impl RetentionScheduler {
    /// Creates a scheduler
    pub fn new(enforcer: Arc<RetentionEnforcer>, interval: Duration) -> Self {
        Self { enforcer, interval }
    }

    /// Runs until `shutdown` turns true or its sender is dropped
    ///
    /// The first pass starts immediately. Passes never overlap; a tick that
    /// arrives while a pass is still running is skipped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Retention scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    match self.enforcer.run_pass(Utc::now()).await {
                        Ok(summary) if !summary.is_successful() => {
                            for error in &summary.errors {
                                tracing::error!(step = %error.step, error = %error.message, "Retention step failed");
                            }
                        }
                        Ok(_) => {}
                        Err(PhiGateError::EnforcementInProgress) => {}
                        Err(e) => tracing::error!(error = %e, "Retention pass failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Retention scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPhiStore;
    use crate::audit::{AuditLogger, AuditSink, MemoryAuditSink};
    use crate::core::retention::RetentionPolicy;
    use crate::crypto::IndexHasher;

    #[tokio::test]
    async fn test_runs_until_shutdown() {
        let sink = Arc::new(MemoryAuditSink::new());
        let audit = AuditLogger::new(
            sink.clone(),
            IndexHasher::new(b"scheduler-test-pepper-00").unwrap(),
        );
        let enforcer = Arc::new(RetentionEnforcer::new(
            Arc::new(InMemoryPhiStore::new()),
            audit,
            RetentionPolicy::default(),
        ));
        let scheduler = RetentionScheduler::new(enforcer, Duration::from_millis(10));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { scheduler.run(rx).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();

        assert!(!sink.entries(None).await.unwrap().is_empty());
    }
}
