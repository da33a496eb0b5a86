//! Transcription job entity and insert DTO.

use hark_core::types::{ExecutionToken, JobId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::status::{JobStatus, StatusId};

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: JobId,
    pub status_id: StatusId,
    pub engine: String,
    pub model: String,
    pub language: String,
    pub audio_url: Option<String>,
    pub audio_path: Option<String>,
    pub filename: Option<String>,
    pub diarize: bool,
    pub word_timestamps: bool,
    pub result: Option<serde_json::Value>,
    pub transcription_text: Option<String>,
    pub error_message: Option<String>,
    pub progress: i16,
    pub retry_count: i32,
    pub execution_token: Option<ExecutionToken>,
    pub webhook_url: Option<String>,
    pub correlation_id: Option<String>,
    pub api_key_id: Option<Uuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl Job {
    /// Decoded status. Rows only ever hold IDs from the seed data, so an
    /// unknown ID is treated as the conservative non-terminal answer.
    pub fn status(&self) -> Option<JobStatus> {
        JobStatus::from_id(self.status_id)
    }

    /// Whether the job has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status().is_some_and(JobStatus::is_terminal)
    }
}

/// Insert DTO for a new pending job. All lifecycle columns start at their
/// defaults (`pending`, progress 0, no token).
#[derive(Debug, Clone)]
pub struct NewJob {
    pub engine: String,
    pub model: String,
    pub language: String,
    pub audio_url: Option<String>,
    pub audio_path: Option<String>,
    pub filename: Option<String>,
    pub diarize: bool,
    pub word_timestamps: bool,
    pub webhook_url: Option<String>,
    pub correlation_id: Option<String>,
    pub api_key_id: Option<Uuid>,
}
