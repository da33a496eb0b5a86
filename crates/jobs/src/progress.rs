//! Fire-and-forget progress persistence.
//!
//! Percent updates travel over an unbounded channel to a single consumer
//! task that writes them through the store. Transcription never blocks on
//! progress I/O and never observes its failures; the store keeps persisted
//! values monotonic per job.

use std::sync::Arc;

use hark_core::types::JobId;
use hark_db::JobStore;
use hark_engine::ProgressSink;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy)]
struct ProgressUpdate {
    job_id: JobId,
    percent: i16,
}

/// Sending half of the progress pipeline. Cheap to clone.
#[derive(Clone)]
pub struct ProgressReporter {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ProgressReporter {
    /// Spawn the consumer task and return the reporter feeding it.
    ///
    /// The consumer drains until every reporter clone is dropped, then
    /// exits; await the handle during shutdown to flush trailing updates.
    pub fn start(store: Arc<dyn JobStore>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<ProgressUpdate>();
        let consumer = tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                match store.set_progress(update.job_id, update.percent).await {
                    Ok(true) => {}
                    // The job left processing; late reports are expected
                    // around terminal transitions.
                    Ok(false) => tracing::debug!(
                        job_id = %update.job_id,
                        percent = update.percent,
                        "Progress update dropped"
                    ),
                    Err(e) => tracing::warn!(
                        job_id = %update.job_id,
                        error = %e,
                        "Progress update failed"
                    ),
                }
            }
        });
        (Self { tx }, consumer)
    }

    /// Queue a progress report. Percentages clamp into `0..=100`.
    pub fn report(&self, job_id: JobId, percent: i16) {
        let update = ProgressUpdate {
            job_id,
            percent: percent.clamp(0, 100),
        };
        // Send only fails once the consumer is gone during shutdown.
        let _ = self.tx.send(update);
    }

    /// Engine-facing sink bound to one job.
    pub fn sink_for(&self, job_id: JobId) -> ProgressSink {
        let reporter = self.clone();
        ProgressSink::new(move |percent| reporter.report(job_id, percent))
    }
}
