//! Job orchestration: the single owner of lifecycle transitions.
//!
//! Submissions, worker attempts, cancellation and the watchdog all funnel
//! through here. Every transition is one conditional store write; webhooks
//! and metrics fire only when the write actually applied, and only after
//! the state is durable.

use std::sync::Arc;
use std::time::Instant;

use hark_core::error::CoreError;
use hark_core::metric_names::{
    METRIC_JOBS_CANCELLED, METRIC_JOBS_COMPLETED, METRIC_JOBS_FAILED, METRIC_JOBS_SUBMITTED,
    METRIC_JOB_DURATION_SECONDS, METRIC_TRANSCRIPTION_DURATION_SECONDS,
};
use hark_core::retry::{RetryDecision, RetryPolicy};
use hark_core::types::{ExecutionToken, JobId};
use hark_db::models::job::{Job, NewJob};
use hark_db::store::{JobStore, StoreError};
use hark_engine::catalog::{DEFAULT_ENGINE, DEFAULT_LANGUAGE, DEFAULT_MODEL};
use hark_engine::{
    AudioSource, EngineKind, TranscribeRequest, Transcriber, Transcript, TranscriptionError,
};
use hark_notify::{JobEvent, Notifier};
use serde::Deserialize;
use uuid::Uuid;

use crate::dispatcher::{DispatchError, DispatchHandle};
use crate::progress::ProgressReporter;
use crate::settings::JobSettings;

/// Error from an orchestrator operation.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// A transcription submission, as accepted over the API.
///
/// Fields marked `skip` are filled in by the server (upload handling,
/// authentication), never by callers.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    /// Fetchable audio URL. Exactly one of `url` / `audio_path` must be set.
    pub url: Option<String>,
    /// Path of an uploaded file on storage shared with the engine sidecar.
    #[serde(skip)]
    pub audio_path: Option<String>,
    /// Original filename of an uploaded file.
    #[serde(skip)]
    pub filename: Option<String>,
    pub engine: Option<String>,
    pub model: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub diarize: bool,
    #[serde(default = "default_word_timestamps")]
    pub word_timestamps: bool,
    pub webhook_url: Option<String>,
    pub correlation_id: Option<String>,
    /// Authenticated key the job is attributed to.
    #[serde(skip)]
    pub api_key_id: Option<Uuid>,
}

fn default_word_timestamps() -> bool {
    true
}

impl Default for SubmitRequest {
    /// Matches the deserialization defaults, not the derived all-zeroes.
    fn default() -> Self {
        Self {
            url: None,
            audio_path: None,
            filename: None,
            engine: None,
            model: None,
            language: None,
            diarize: false,
            word_timestamps: true,
            webhook_url: None,
            correlation_id: None,
            api_key_id: None,
        }
    }
}

/// Coordinates the full job lifecycle against the store.
pub struct Orchestrator {
    store: Arc<dyn JobStore>,
    notifier: Arc<dyn Notifier>,
    retry_policy: Arc<dyn RetryPolicy>,
    dispatch: DispatchHandle,
    progress: ProgressReporter,
    settings: JobSettings,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn JobStore>,
        notifier: Arc<dyn Notifier>,
        retry_policy: Arc<dyn RetryPolicy>,
        dispatch: DispatchHandle,
        progress: ProgressReporter,
        settings: JobSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            retry_policy,
            dispatch,
            progress,
            settings,
        }
    }

    // -----------------------------------------------------------------------
    // Client-facing operations
    // -----------------------------------------------------------------------

    /// Validate a submission, persist it as a pending job and dispatch it.
    ///
    /// A dispatch failure is returned after the row already exists: the job
    /// stays pending, visible to operators, instead of being lost.
    pub async fn submit(&self, request: SubmitRequest) -> Result<Job, OrchestratorError> {
        let engine = match &request.engine {
            Some(name) => name
                .parse::<EngineKind>()
                .map_err(|e| CoreError::Validation(e.to_string()))?,
            None => DEFAULT_ENGINE,
        };

        let sources = request.url.is_some() as usize + request.audio_path.is_some() as usize;
        if sources != 1 {
            return Err(CoreError::Validation(
                "Provide exactly one audio source: a url or an uploaded file".to_string(),
            )
            .into());
        }
        if let Some(url) = &request.url {
            validate_http_url(url, "Audio url")?;
        }
        if let Some(url) = &request.webhook_url {
            validate_http_url(url, "Webhook url")?;
        }

        let new_job = NewJob {
            engine: engine.as_str().to_string(),
            model: request
                .model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            language: request
                .language
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            audio_url: request.url,
            audio_path: request.audio_path,
            filename: request.filename,
            diarize: request.diarize,
            word_timestamps: request.word_timestamps,
            webhook_url: request.webhook_url,
            correlation_id: request.correlation_id,
            api_key_id: request.api_key_id,
        };

        let job = self.store.create(new_job).await?;
        metrics::counter!(METRIC_JOBS_SUBMITTED).increment(1);
        tracing::info!(job_id = %job.id, engine = %job.engine, model = %job.model, "Job submitted");

        if let Err(e) = self.dispatch.dispatch(job.id) {
            tracing::error!(job_id = %job.id, error = %e, "Job persisted but dispatch failed; it stays pending");
            return Err(e.into());
        }
        Ok(job)
    }

    /// Fetch a job by id.
    pub async fn get(&self, id: JobId) -> Result<Job, OrchestratorError> {
        self.store
            .get(id)
            .await?
            .ok_or(OrchestratorError::Core(CoreError::NotFound {
                entity: "job",
                id,
            }))
    }

    /// Cancel a job that has not reached a terminal status.
    ///
    /// Returns `false` when the job is already terminal. A worker mid-flight
    /// keeps running, but its terminal write dies on the status guard and
    /// the job stays cancelled.
    pub async fn cancel(&self, id: JobId) -> Result<bool, OrchestratorError> {
        // Distinguish "no such job" from "already terminal".
        let _ = self.get(id).await?;
        let cancelled = self.store.cancel(id).await?;
        if cancelled {
            metrics::counter!(METRIC_JOBS_CANCELLED).increment(1);
            tracing::info!(job_id = %id, "Job cancelled");
        }
        Ok(cancelled)
    }

    /// Queue an external progress report for a processing job.
    pub fn report_progress(&self, id: JobId, percent: i16) {
        self.progress.report(id, percent);
    }

    // -----------------------------------------------------------------------
    // Worker-facing operations
    // -----------------------------------------------------------------------

    /// Execute one dispatched attempt end to end.
    ///
    /// Claims the job under the attempt's token, runs the transcriber and
    /// routes the outcome through [`Self::complete`] or the retry decision.
    /// Every store write on this path is token-guarded, so a stale attempt
    /// (cancelled, timed out or superseded job) falls out quietly at the
    /// first guard it hits.
    pub async fn run_attempt(
        &self,
        id: JobId,
        token: ExecutionToken,
        transcriber: &dyn Transcriber,
    ) -> Result<(), OrchestratorError> {
        let Some(job) = self.store.claim(id, token).await? else {
            tracing::debug!(job_id = %id, "Dispatch superseded; job not claimable");
            return Ok(());
        };
        tracing::info!(job_id = %id, retry_count = job.retry_count, "Attempt started");

        if let Some(url) = &job.webhook_url {
            // The processing state is durable before anyone hears about it.
            self.send_webhook(url, JobEvent::processing(job.correlation_id.clone()))
                .await;
        }

        let request = match build_transcribe_request(&job) {
            Ok(request) => request,
            Err(e) => {
                // The row predates a config change or was edited by hand;
                // retrying cannot fix it.
                let message = e.to_string();
                tracing::error!(job_id = %id, error = %message, "Stored job is not runnable");
                return self.fail(id, token, &message).await;
            }
        };

        let started = Instant::now();
        let outcome = transcriber
            .transcribe(&request, self.progress.sink_for(id))
            .await;
        metrics::histogram!(METRIC_TRANSCRIPTION_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        match outcome {
            Ok(transcript) => self.complete(id, token, &transcript).await,
            Err(e) => self.handle_attempt_failure(&job, token, &e).await,
        }
    }

    /// Record a successful result for the attempt holding `token`.
    ///
    /// No-op when the attempt is stale; the discarded result is logged and
    /// nothing else moves.
    pub async fn complete(
        &self,
        id: JobId,
        token: ExecutionToken,
        transcript: &Transcript,
    ) -> Result<(), OrchestratorError> {
        let result = serde_json::to_value(transcript)
            .map_err(|e| CoreError::Internal(format!("Failed to encode transcript: {e}")))?;
        let text = transcript.plain_text();

        let applied = self.store.complete(id, token, &result, &text).await?;
        if !applied {
            tracing::info!(job_id = %id, "Stale attempt result discarded");
            return Ok(());
        }
        metrics::counter!(METRIC_JOBS_COMPLETED).increment(1);
        tracing::info!(job_id = %id, "Job completed");

        if let Some(job) = self.store.get(id).await? {
            record_job_duration(&job);
            if let Some(url) = &job.webhook_url {
                self.send_webhook(url, JobEvent::completed(job.correlation_id.clone(), text))
                    .await;
            }
        }
        Ok(())
    }

    /// Record a terminal failure for the attempt holding `token`.
    pub async fn fail(
        &self,
        id: JobId,
        token: ExecutionToken,
        error: &str,
    ) -> Result<(), OrchestratorError> {
        let applied = self.store.fail(id, token, error).await?;
        if !applied {
            tracing::info!(job_id = %id, "Stale attempt failure discarded");
            return Ok(());
        }
        metrics::counter!(METRIC_JOBS_FAILED).increment(1);
        tracing::warn!(job_id = %id, error, "Job failed");

        if let Some(job) = self.store.get(id).await? {
            record_job_duration(&job);
            if let Some(url) = &job.webhook_url {
                self.send_webhook(
                    url,
                    JobEvent::failed(job.correlation_id.clone(), error.to_string()),
                )
                .await;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Route a failed attempt through the retry policy.
    async fn handle_attempt_failure(
        &self,
        job: &Job,
        token: ExecutionToken,
        error: &TranscriptionError,
    ) -> Result<(), OrchestratorError> {
        // `retry_count` counts prior failures; this one makes it +1.
        let failures = job.retry_count + 1;
        match self.retry_policy.decide(failures, self.settings.max_retries) {
            RetryDecision::Retry { delay } => {
                let requeued = self.store.requeue(job.id, token).await?;
                if !requeued {
                    tracing::info!(job_id = %job.id, "Stale attempt failure discarded");
                    return Ok(());
                }
                tracing::warn!(
                    job_id = %job.id,
                    failures,
                    delay_secs = delay.as_secs(),
                    error = %error,
                    "Attempt failed; retry scheduled"
                );
                self.dispatch.dispatch_after(job.id, delay);
                Ok(())
            }
            RetryDecision::GiveUp => self.fail(job.id, token, &error.to_string()).await,
        }
    }

    /// Fire a webhook and log on failure. Delivery problems never touch
    /// job state.
    async fn send_webhook(&self, url: &str, event: JobEvent) {
        if let Err(e) = self.notifier.notify(url, &event).await {
            tracing::warn!(url, error = %e, "Webhook delivery failed");
        }
    }
}

fn validate_http_url(url: &str, what: &str) -> Result<(), CoreError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("{what} must be http(s)")))
    }
}

/// Reconstruct the engine request from a stored row.
fn build_transcribe_request(job: &Job) -> Result<TranscribeRequest, CoreError> {
    let engine = job
        .engine
        .parse::<EngineKind>()
        .map_err(|e| CoreError::Validation(e.to_string()))?;
    let source = match (&job.audio_url, &job.audio_path) {
        (Some(url), _) => AudioSource::Url(url.clone()),
        (None, Some(path)) => AudioSource::File(path.into()),
        (None, None) => {
            return Err(CoreError::Validation("Job has no audio source".to_string()));
        }
    };
    Ok(TranscribeRequest {
        source,
        engine,
        model: job.model.clone(),
        language: job.language.clone(),
        diarize: job.diarize,
        word_timestamps: job.word_timestamps,
    })
}

fn record_job_duration(job: &Job) {
    if let Some(completed_at) = job.completed_at {
        let elapsed = (completed_at - job.created_at).num_milliseconds() as f64 / 1000.0;
        metrics::histogram!(METRIC_JOB_DURATION_SECONDS).record(elapsed.max(0.0));
    }
}
