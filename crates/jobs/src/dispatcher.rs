//! Dispatch queue and worker pool.
//!
//! Jobs travel from submission to a worker over a bounded channel. Every
//! dispatch mints a fresh execution token and the worker claims the job
//! under that token, so a duplicate or superseded dispatch dies at the
//! claim instead of running twice.

use std::sync::Arc;
use std::time::Duration;

use hark_core::metric_names::{METRIC_ACTIVE_WORKERS, METRIC_QUEUE_DEPTH};
use hark_core::types::{ExecutionToken, JobId};
use hark_engine::Transcriber;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::orchestrator::Orchestrator;

/// Dispatch could not enqueue the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Dispatch queue is full")]
    QueueFull,

    #[error("Dispatch queue is closed")]
    QueueClosed,
}

/// One queued attempt: the job and the token it must claim under.
#[derive(Debug, Clone, Copy)]
struct DispatchRequest {
    job_id: JobId,
    token: ExecutionToken,
}

/// Sending half of the dispatch queue. Cheap to clone.
#[derive(Clone)]
pub struct DispatchHandle {
    tx: mpsc::Sender<DispatchRequest>,
}

/// Receiving half of the dispatch queue, consumed by [`Dispatcher::start`].
pub struct DispatchQueue {
    rx: mpsc::Receiver<DispatchRequest>,
}

/// Create the dispatch queue with the given capacity.
pub fn dispatch_channel(capacity: usize) -> (DispatchHandle, DispatchQueue) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (DispatchHandle { tx }, DispatchQueue { rx })
}

impl DispatchHandle {
    /// Queue an attempt for `job_id` under a freshly minted token.
    ///
    /// Fails fast when the queue is full or the workers are gone. The job
    /// row is untouched either way; the caller decides what to surface.
    pub fn dispatch(&self, job_id: JobId) -> Result<ExecutionToken, DispatchError> {
        let token = Uuid::new_v4();
        self.tx
            .try_send(DispatchRequest { job_id, token })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => DispatchError::QueueClosed,
            })?;
        metrics::gauge!(METRIC_QUEUE_DEPTH).increment(1.0);
        tracing::debug!(%job_id, %token, "Job dispatched");
        Ok(token)
    }

    /// Queue an attempt for `job_id` after `delay` (retry backoff).
    ///
    /// The job stays pending until the delayed dispatch lands, so a failure
    /// here leaves it visible to operators rather than silently lost.
    pub fn dispatch_after(&self, job_id: JobId, delay: Duration) {
        let handle = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = handle.dispatch(job_id) {
                tracing::error!(%job_id, error = %e, "Delayed re-dispatch failed; job stays pending");
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Worker pool
// ---------------------------------------------------------------------------

/// Pool of transcription workers draining the dispatch queue.
pub struct Dispatcher {
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawn `concurrency` workers draining `queue` until `cancel` fires.
    pub fn start(
        queue: DispatchQueue,
        orchestrator: Arc<Orchestrator>,
        transcriber: Arc<dyn Transcriber>,
        concurrency: usize,
        cancel: CancellationToken,
    ) -> Self {
        let rx = Arc::new(Mutex::new(queue.rx));
        let concurrency = concurrency.max(1);
        let workers = (0..concurrency)
            .map(|worker| {
                let rx = Arc::clone(&rx);
                let orchestrator = Arc::clone(&orchestrator);
                let transcriber = Arc::clone(&transcriber);
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    worker_loop(worker, rx, orchestrator, transcriber, cancel).await;
                })
            })
            .collect();
        tracing::info!(concurrency, "Transcription workers started");
        Self { workers }
    }

    /// Wait for every worker to finish its in-flight attempt and exit.
    pub async fn join(self) {
        for handle in self.workers {
            let _ = handle.await;
        }
        tracing::info!("Transcription workers stopped");
    }
}

async fn worker_loop(
    worker: usize,
    rx: Arc<Mutex<mpsc::Receiver<DispatchRequest>>>,
    orchestrator: Arc<Orchestrator>,
    transcriber: Arc<dyn Transcriber>,
    cancel: CancellationToken,
) {
    loop {
        // Hold the receiver lock only while idle; an in-flight attempt must
        // not block the other workers from picking up the next job.
        let request = {
            let mut rx = rx.lock().await;
            tokio::select! {
                _ = cancel.cancelled() => None,
                request = rx.recv() => request,
            }
        };
        let Some(request) = request else { break };

        metrics::gauge!(METRIC_QUEUE_DEPTH).decrement(1.0);
        metrics::gauge!(METRIC_ACTIVE_WORKERS).increment(1.0);
        if let Err(e) = orchestrator
            .run_attempt(request.job_id, request.token, transcriber.as_ref())
            .await
        {
            tracing::error!(worker, job_id = %request.job_id, error = %e, "Attempt aborted");
        }
        metrics::gauge!(METRIC_ACTIVE_WORKERS).decrement(1.0);
    }
    tracing::debug!(worker, "Transcription worker stopped");
}
