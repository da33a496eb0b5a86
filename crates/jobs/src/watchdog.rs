//! Background sweep that force-fails hung processing attempts.
//!
//! Crashed workers, lost tasks and wedged sidecar calls all leave the same
//! residue: a job stuck in processing with an aging claim. The watchdog
//! turns those into ordinary failures, webhooks included, once the claim
//! outlives the job timeout.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hark_core::metric_names::METRIC_JOBS_FAILED;
use hark_db::models::job::Job;
use hark_db::store::{JobStore, StoreError};
use hark_notify::{JobEvent, Notifier};
use tokio_util::sync::CancellationToken;

use crate::settings::JobSettings;

pub struct Watchdog {
    store: Arc<dyn JobStore>,
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
    interval: Duration,
}

impl Watchdog {
    pub fn new(
        store: Arc<dyn JobStore>,
        notifier: Arc<dyn Notifier>,
        settings: &JobSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            timeout: settings.job_timeout,
            interval: settings.watchdog_interval,
        }
    }

    /// Sweep on an interval until the cancellation token fires.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            timeout_secs = self.timeout.as_secs(),
            "Job watchdog started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job watchdog shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        tracing::error!(error = %e, "Watchdog sweep failed");
                    }
                }
            }
        }
    }

    /// One sweep: fail every attempt claimed before the timeout horizon.
    ///
    /// Returns the swept jobs so callers can inspect what was reaped.
    pub async fn sweep_once(&self) -> Result<Vec<Job>, StoreError> {
        let horizon = Utc::now() - chrono::Duration::seconds(self.timeout.as_secs() as i64);
        let error = format!("Job timed out after {} seconds", self.timeout.as_secs());

        let swept = self.store.sweep_timed_out(horizon, &error).await?;
        for job in &swept {
            metrics::counter!(METRIC_JOBS_FAILED).increment(1);
            tracing::warn!(job_id = %job.id, "Job force-failed by watchdog");
            if let Some(url) = &job.webhook_url {
                let event = JobEvent::failed(job.correlation_id.clone(), error.clone());
                if let Err(e) = self.notifier.notify(url, &event).await {
                    tracing::warn!(url, error = %e, "Webhook delivery failed");
                }
            }
        }
        Ok(swept)
    }
}
