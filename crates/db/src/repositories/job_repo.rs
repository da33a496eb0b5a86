//! PostgreSQL implementation of the job store.
//!
//! Uses the `JobStatus` enum from `models::status` for all status
//! transitions. No magic numbers — every status literal is a named constant.
//! Each transition is one conditional UPDATE whose WHERE clause carries the
//! expected status and, where an attempt is involved, the execution token.

use async_trait::async_trait;
use hark_core::types::{ExecutionToken, JobId, Timestamp};
use sqlx::PgPool;

use crate::models::job::{Job, NewJob};
use crate::models::status::{JobStatus, StatusId};
use crate::store::{JobStore, StoreError};

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, status_id, engine, model, language, \
    audio_url, audio_path, filename, diarize, word_timestamps, \
    result, transcription_text, error_message, progress, retry_count, \
    execution_token, webhook_url, correlation_id, api_key_id, \
    created_at, updated_at, claimed_at, started_at, completed_at";

/// Terminal statuses: completed, failed, cancelled.
const TERMINAL_STATUSES: [StatusId; 3] = [
    JobStatus::Completed as StatusId,
    JobStatus::Failed as StatusId,
    JobStatus::Cancelled as StatusId,
];

/// Job store backed by the shared PostgreSQL pool.
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, new: NewJob) -> Result<Job, StoreError> {
        let query = format!(
            "INSERT INTO jobs \
                 (status_id, engine, model, language, audio_url, audio_path, filename, \
                  diarize, word_timestamps, webhook_url, correlation_id, api_key_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        let job = sqlx::query_as::<_, Job>(&query)
            .bind(JobStatus::Pending.id())
            .bind(&new.engine)
            .bind(&new.model)
            .bind(&new.language)
            .bind(&new.audio_url)
            .bind(&new.audio_path)
            .bind(&new.filename)
            .bind(new.diarize)
            .bind(new.word_timestamps)
            .bind(&new.webhook_url)
            .bind(&new.correlation_id)
            .bind(new.api_key_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(job)
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        let job = sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    async fn claim(&self, id: JobId, token: ExecutionToken) -> Result<Option<Job>, StoreError> {
        // `started_at` is stamped exactly once, on the first claim; retries
        // keep the original value while `claimed_at` tracks the newest
        // attempt for the watchdog.
        let query = format!(
            "UPDATE jobs \
             SET status_id = $3, execution_token = $2, claimed_at = NOW(), \
                 started_at = COALESCE(started_at, NOW()), updated_at = NOW() \
             WHERE id = $1 AND status_id = $4 \
             RETURNING {COLUMNS}"
        );
        let job = sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(token)
            .bind(JobStatus::Processing.id())
            .bind(JobStatus::Pending.id())
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    async fn complete(
        &self,
        id: JobId,
        token: ExecutionToken,
        result: &serde_json::Value,
        transcription_text: &str,
    ) -> Result<bool, StoreError> {
        let outcome = sqlx::query(
            "UPDATE jobs \
             SET status_id = $3, result = $4, transcription_text = $5, progress = 100, \
                 completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND execution_token = $2 AND status_id = $6",
        )
        .bind(id)
        .bind(token)
        .bind(JobStatus::Completed.id())
        .bind(result)
        .bind(transcription_text)
        .bind(JobStatus::Processing.id())
        .execute(&self.pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    async fn fail(
        &self,
        id: JobId,
        token: ExecutionToken,
        error: &str,
    ) -> Result<bool, StoreError> {
        let outcome = sqlx::query(
            "UPDATE jobs \
             SET status_id = $3, error_message = $4, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND execution_token = $2 AND status_id = $5",
        )
        .bind(id)
        .bind(token)
        .bind(JobStatus::Failed.id())
        .bind(error)
        .bind(JobStatus::Processing.id())
        .execute(&self.pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    async fn requeue(&self, id: JobId, token: ExecutionToken) -> Result<bool, StoreError> {
        let outcome = sqlx::query(
            "UPDATE jobs \
             SET status_id = $3, retry_count = retry_count + 1, execution_token = NULL, \
                 updated_at = NOW() \
             WHERE id = $1 AND execution_token = $2 AND status_id = $4",
        )
        .bind(id)
        .bind(token)
        .bind(JobStatus::Pending.id())
        .bind(JobStatus::Processing.id())
        .execute(&self.pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    async fn cancel(&self, id: JobId) -> Result<bool, StoreError> {
        let outcome = sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status_id NOT IN ($3, $4, $5)",
        )
        .bind(id)
        .bind(JobStatus::Cancelled.id())
        .bind(TERMINAL_STATUSES[0])
        .bind(TERMINAL_STATUSES[1])
        .bind(TERMINAL_STATUSES[2])
        .execute(&self.pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    async fn set_progress(&self, id: JobId, percent: i16) -> Result<bool, StoreError> {
        // GREATEST keeps progress monotonic even when late updates from a
        // superseded attempt race a newer one.
        let outcome = sqlx::query(
            "UPDATE jobs \
             SET progress = GREATEST(progress, $2), updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(percent)
        .bind(JobStatus::Processing.id())
        .execute(&self.pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    async fn sweep_timed_out(
        &self,
        claimed_before: Timestamp,
        error: &str,
    ) -> Result<Vec<Job>, StoreError> {
        let query = format!(
            "UPDATE jobs \
             SET status_id = $1, error_message = $2, completed_at = NOW(), updated_at = NOW() \
             WHERE status_id = $3 AND claimed_at < $4 \
             RETURNING {COLUMNS}"
        );
        let swept = sqlx::query_as::<_, Job>(&query)
            .bind(JobStatus::Failed.id())
            .bind(error)
            .bind(JobStatus::Processing.id())
            .bind(claimed_before)
            .fetch_all(&self.pool)
            .await?;
        Ok(swept)
    }
}
