//! The persistence contract the orchestrator runs against.
//!
//! Every mutation is conditional: the implementation must only apply the
//! write when the job is in the expected status (and, for attempt-scoped
//! writes, still carries the expected execution token). The `bool` returns
//! report whether the write happened, so callers can treat a stale attempt
//! as a quiet no-op instead of an error.

use async_trait::async_trait;
use hark_core::types::{ExecutionToken, JobId, Timestamp};

use crate::models::job::{Job, NewJob};

/// Failure while reading or writing the job store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read/write contract for transcription jobs.
///
/// The production implementation is [`PgJobStore`](crate::repositories::job_repo::PgJobStore);
/// orchestrator tests substitute an in-memory one. Implementations must make
/// each method a single atomic compare-and-set so that concurrent callers
/// and superseded attempts cannot interleave partial updates.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new pending job and return the stored row.
    async fn create(&self, new: NewJob) -> Result<Job, StoreError>;

    /// Fetch a job by id.
    async fn get(&self, id: JobId) -> Result<Option<Job>, StoreError>;

    /// Move a pending job to processing and install the attempt's token.
    ///
    /// Sets `claimed_at` on every claim and `started_at` only on the first.
    /// Returns the claimed row, or `None` when the job is not pending
    /// (duplicate dispatch, cancelled in the meantime, already claimed).
    async fn claim(&self, id: JobId, token: ExecutionToken) -> Result<Option<Job>, StoreError>;

    /// Move a processing job to completed with its transcription result.
    ///
    /// Only applies when the job is still processing under `token`. Sets
    /// progress to 100 and stamps `completed_at`.
    async fn complete(
        &self,
        id: JobId,
        token: ExecutionToken,
        result: &serde_json::Value,
        transcription_text: &str,
    ) -> Result<bool, StoreError>;

    /// Move a processing job to failed with a final error message.
    ///
    /// Only applies when the job is still processing under `token`.
    async fn fail(&self, id: JobId, token: ExecutionToken, error: &str)
        -> Result<bool, StoreError>;

    /// Return a processing job to pending for another attempt.
    ///
    /// Increments `retry_count` and clears the token, so the superseded
    /// attempt can no longer touch the job. Only applies when the job is
    /// still processing under `token`.
    async fn requeue(&self, id: JobId, token: ExecutionToken) -> Result<bool, StoreError>;

    /// Cancel a job unless it already reached a terminal status.
    ///
    /// Returns `true` if the job was cancelled, `false` if it was already
    /// completed, failed, or cancelled.
    async fn cancel(&self, id: JobId) -> Result<bool, StoreError>;

    /// Raise the progress of a processing job to `percent`.
    ///
    /// Progress is monotonic: an update below the stored value leaves the
    /// row unchanged. Updates for jobs not in processing are dropped.
    async fn set_progress(&self, id: JobId, percent: i16) -> Result<bool, StoreError>;

    /// Force-fail every processing job claimed before `claimed_before`.
    ///
    /// Used by the watchdog for attempts that never reported a terminal
    /// transition. Returns the swept rows so the caller can emit failure
    /// notifications.
    async fn sweep_timed_out(
        &self,
        claimed_before: Timestamp,
        error: &str,
    ) -> Result<Vec<Job>, StoreError>;
}
