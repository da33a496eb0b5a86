//! Handlers for the `/jobs` resource.
//!
//! All endpoints require authentication via [`AuthedKey`]. Keys
//! authenticate callers but do not partition jobs: any valid key may query
//! any job, and `api_key_id` on the row records attribution only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hark_core::error::CoreError;
use hark_core::types::{JobId, Timestamp};
use hark_db::models::job::Job;
use hark_db::models::status::JobStatus;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthedKey;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response shape
// ---------------------------------------------------------------------------

/// Public job representation returned by the submit and status endpoints.
///
/// `result` is present only on completed jobs and `error` only on failed
/// ones, so a retried job never shows a stale error next to live progress.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: JobId,
    pub status: &'static str,
    pub progress: i16,
    pub engine: String,
    pub model: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        let status = job.status();
        Self {
            job_id: job.id,
            status: status.map(JobStatus::as_str).unwrap_or("unknown"),
            progress: job.progress,
            engine: job.engine,
            model: job.model,
            language: job.language,
            filename: job.filename,
            correlation_id: job.correlation_id,
            created_at: job.created_at,
            updated_at: job.updated_at,
            completed_at: job.completed_at,
            result: (status == Some(JobStatus::Completed))
                .then_some(job.result)
                .flatten(),
            error: (status == Some(JobStatus::Failed))
                .then_some(job.error_message)
                .flatten(),
        }
    }
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs/{id}
///
/// Get the current status of a job, including the transcription result
/// once it completes.
pub async fn get_job(
    _auth: AuthedKey,
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let job = state.orchestrator.get(job_id).await?;
    Ok(Json(DataResponse {
        data: JobStatusResponse::from(job),
    }))
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// DELETE /api/v1/jobs/{id}
///
/// Cancel a pending or processing job. Returns 204 on success, 404 for an
/// unknown job, and 409 if the job is already in a terminal state.
pub async fn cancel_job(
    _auth: AuthedKey,
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let cancelled = state.orchestrator.cancel(job_id).await?;

    if !cancelled {
        return Err(AppError::Core(CoreError::Conflict(
            "Job is already in a terminal state and cannot be cancelled".into(),
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
