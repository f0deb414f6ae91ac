use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{Duration, sleep};

use crate::services::reconciler::Reconciler;

/// Runs the reconciler on a fixed interval so drift introduced out-of-band
/// (a blob dropped straight into the bucket, a row left behind) heals
/// without anyone opening the workflow page.
pub struct BackgroundWorker {
    reconciler: Arc<Reconciler>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl BackgroundWorker {
    pub fn new(
        reconciler: Arc<Reconciler>,
        interval_secs: u64,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            reconciler,
            interval: Duration::from_secs(interval_secs),
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("🚀 Background reconciliation worker started");

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Background worker shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    match self.reconciler.run().await {
                        Ok(report) if report.inserted + report.deleted + report.failed > 0 => {
                            tracing::info!(
                                "🧹 Periodic reconciliation: +{} rows, -{} rows, {} failures",
                                report.inserted,
                                report.deleted,
                                report.failed
                            );
                        }
                        Ok(_) => {
                            tracing::debug!("Periodic reconciliation: nothing to do");
                        }
                        Err(e) => {
                            tracing::error!("Periodic reconciliation failed: {}", e);
                        }
                    }
                }
            }
        }
    }
}
