//! Shared fixtures for orchestration tests.
//!
//! `MemoryJobStore` mirrors the conditional-update semantics of the
//! Postgres store so lifecycle tests run against real orchestrator wiring
//! without a database. Scripted transcribers and a recording notifier stand
//! in for the sidecar and webhook receivers.

// Each test binary uses a different subset of these fixtures.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hark_core::lifecycle::{
    STATUS_CANCELLED, STATUS_COMPLETED, STATUS_FAILED, STATUS_PENDING, STATUS_PROCESSING,
};
use hark_core::retry::LinearBackoff;
use hark_core::types::{ExecutionToken, JobId, Timestamp};
use hark_db::models::job::{Job, NewJob};
use hark_db::store::{JobStore, StoreError};
use hark_engine::{
    ProgressSink, Segment, TranscribeRequest, Transcriber, Transcript, TranscriptionError,
};
use hark_jobs::{
    dispatch_channel, Dispatcher, JobSettings, Orchestrator, ProgressReporter, SubmitRequest,
};
use hark_notify::{JobEvent, Notifier, NotifyError};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// In-memory job store
// ---------------------------------------------------------------------------

/// `JobStore` over a `HashMap`, with the same status and token guards as
/// the SQL implementation.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current copy of a job for assertions.
    pub fn snapshot(&self, id: JobId) -> Option<Job> {
        self.jobs.lock().unwrap().get(&id).cloned()
    }

    /// Every stored job, in no particular order.
    pub fn all(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().values().cloned().collect()
    }

    /// Shift a claim into the past so a watchdog horizon passes it.
    pub fn backdate_claim(&self, id: JobId, by: chrono::Duration) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(&id) {
            job.claimed_at = job.claimed_at.map(|t| t - by);
        }
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, new: NewJob) -> Result<Job, StoreError> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            status_id: STATUS_PENDING,
            engine: new.engine,
            model: new.model,
            language: new.language,
            audio_url: new.audio_url,
            audio_path: new.audio_path,
            filename: new.filename,
            diarize: new.diarize,
            word_timestamps: new.word_timestamps,
            result: None,
            transcription_text: None,
            error_message: None,
            progress: 0,
            retry_count: 0,
            execution_token: None,
            webhook_url: new.webhook_url,
            correlation_id: new.correlation_id,
            api_key_id: new.api_key_id,
            created_at: now,
            updated_at: now,
            claimed_at: None,
            started_at: None,
            completed_at: None,
        };
        self.jobs.lock().unwrap().insert(job.id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.snapshot(id))
    }

    async fn claim(&self, id: JobId, token: ExecutionToken) -> Result<Option<Job>, StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(None);
        };
        if job.status_id != STATUS_PENDING {
            return Ok(None);
        }
        let now = Utc::now();
        job.status_id = STATUS_PROCESSING;
        job.execution_token = Some(token);
        job.claimed_at = Some(now);
        job.started_at.get_or_insert(now);
        job.updated_at = now;
        Ok(Some(job.clone()))
    }

    async fn complete(
        &self,
        id: JobId,
        token: ExecutionToken,
        result: &serde_json::Value,
        transcription_text: &str,
    ) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(false);
        };
        if job.status_id != STATUS_PROCESSING || job.execution_token != Some(token) {
            return Ok(false);
        }
        let now = Utc::now();
        job.status_id = STATUS_COMPLETED;
        job.result = Some(result.clone());
        job.transcription_text = Some(transcription_text.to_string());
        job.progress = 100;
        job.completed_at = Some(now);
        job.updated_at = now;
        Ok(true)
    }

    async fn fail(
        &self,
        id: JobId,
        token: ExecutionToken,
        error: &str,
    ) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(false);
        };
        if job.status_id != STATUS_PROCESSING || job.execution_token != Some(token) {
            return Ok(false);
        }
        let now = Utc::now();
        job.status_id = STATUS_FAILED;
        job.error_message = Some(error.to_string());
        job.completed_at = Some(now);
        job.updated_at = now;
        Ok(true)
    }

    async fn requeue(&self, id: JobId, token: ExecutionToken) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(false);
        };
        if job.status_id != STATUS_PROCESSING || job.execution_token != Some(token) {
            return Ok(false);
        }
        job.status_id = STATUS_PENDING;
        job.retry_count += 1;
        job.execution_token = None;
        job.updated_at = Utc::now();
        Ok(true)
    }

    async fn cancel(&self, id: JobId) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(false);
        };
        if job.is_terminal() {
            return Ok(false);
        }
        let now = Utc::now();
        job.status_id = STATUS_CANCELLED;
        job.completed_at = Some(now);
        job.updated_at = now;
        Ok(true)
    }

    async fn set_progress(&self, id: JobId, percent: i16) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&id) else {
            return Ok(false);
        };
        if job.status_id != STATUS_PROCESSING {
            return Ok(false);
        }
        job.progress = job.progress.max(percent);
        job.updated_at = Utc::now();
        Ok(true)
    }

    async fn sweep_timed_out(
        &self,
        claimed_before: Timestamp,
        error: &str,
    ) -> Result<Vec<Job>, StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let now = Utc::now();
        let mut swept = Vec::new();
        for job in jobs.values_mut() {
            let expired = job.status_id == STATUS_PROCESSING
                && job.claimed_at.is_some_and(|t| t < claimed_before);
            if expired {
                job.status_id = STATUS_FAILED;
                job.error_message = Some(error.to_string());
                job.completed_at = Some(now);
                job.updated_at = now;
                swept.push(job.clone());
            }
        }
        Ok(swept)
    }
}

// ---------------------------------------------------------------------------
// Scripted transcribers
// ---------------------------------------------------------------------------

pub fn sample_transcript() -> Transcript {
    Transcript {
        text: "hello from the fixture".to_string(),
        language: "he".to_string(),
        duration: 12.5,
        segments: vec![Segment {
            id: 0,
            start: 0.0,
            end: 12.5,
            text: "hello from the fixture".to_string(),
            speaker: None,
            words: None,
        }],
    }
}

/// Fails the first `failures` calls, then succeeds forever.
pub struct FlakyTranscriber {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakyTranscriber {
    pub fn failing(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::failing(0)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for FlakyTranscriber {
    async fn transcribe(
        &self,
        _request: &TranscribeRequest,
        progress: ProgressSink,
    ) -> Result<Transcript, TranscriptionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(TranscriptionError::ApiError(
                "HTTP 500: engine crashed".to_string(),
            ));
        }
        progress.report(10);
        progress.report(90);
        Ok(sample_transcript())
    }
}

/// Parks mid-attempt until released, so tests can interleave other
/// operations while a job is processing.
pub struct GatedTranscriber {
    entered: Arc<Notify>,
    release: Arc<Notify>,
    calls: AtomicUsize,
}

impl GatedTranscriber {
    pub fn new() -> Self {
        Self {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Resolves once an attempt has entered the transcriber.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the parked attempt finish with the sample transcript.
    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for GatedTranscriber {
    async fn transcribe(
        &self,
        _request: &TranscribeRequest,
        _progress: ProgressSink,
    ) -> Result<Transcript, TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(sample_transcript())
    }
}

// ---------------------------------------------------------------------------
// Recording notifier
// ---------------------------------------------------------------------------

/// Captures every webhook instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, JobEvent)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records events but reports every delivery as failed.
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn events(&self) -> Vec<(String, JobEvent)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, url: &str, event: &JobEvent) -> Result<(), NotifyError> {
        self.events
            .lock()
            .unwrap()
            .push((url.to_string(), event.clone()));
        if self.fail {
            return Err(NotifyError::HttpStatus(503));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Orchestrator, workers and progress pipeline wired like production.
pub struct Harness {
    pub store: Arc<MemoryJobStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub orchestrator: Arc<Orchestrator>,
    cancel: CancellationToken,
    dispatcher: Dispatcher,
    progress_task: JoinHandle<()>,
}

impl Harness {
    /// Stop the workers, then flush and stop the progress consumer.
    ///
    /// Call this with no other clones of `orchestrator` alive, or the
    /// progress consumer will not see its channel close.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.dispatcher.join().await;
        drop(self.orchestrator);
        let _ = self.progress_task.await;
    }
}

/// Settings sized so retry tests finish in milliseconds.
pub fn test_settings() -> JobSettings {
    JobSettings {
        max_retries: 3,
        worker_concurrency: 2,
        queue_capacity: 16,
        job_timeout: Duration::from_secs(3600),
        watchdog_interval: Duration::from_secs(3600),
    }
}

pub async fn start_harness(transcriber: Arc<dyn Transcriber>) -> Harness {
    start_harness_with(transcriber, RecordingNotifier::new(), test_settings()).await
}

pub async fn start_harness_with(
    transcriber: Arc<dyn Transcriber>,
    notifier: RecordingNotifier,
    settings: JobSettings,
) -> Harness {
    let store = Arc::new(MemoryJobStore::new());
    let notifier = Arc::new(notifier);
    let (progress, progress_task) = ProgressReporter::start(store.clone());
    let (handle, queue) = dispatch_channel(settings.queue_capacity);
    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        notifier.clone(),
        Arc::new(LinearBackoff::new(Duration::from_millis(2))),
        handle,
        progress,
        settings.clone(),
    ));
    let cancel = CancellationToken::new();
    let dispatcher = Dispatcher::start(
        queue,
        orchestrator.clone(),
        transcriber,
        settings.worker_concurrency,
        cancel.clone(),
    );
    Harness {
        store,
        notifier,
        orchestrator,
        cancel,
        dispatcher,
        progress_task,
    }
}

// ---------------------------------------------------------------------------
// Waiting
// ---------------------------------------------------------------------------

const WAIT_DEADLINE: Duration = Duration::from_secs(5);
const WAIT_POLL: Duration = Duration::from_millis(5);

/// Poll until the job reaches `status`, panicking after a bounded wait.
pub async fn wait_for_status(store: &MemoryJobStore, id: JobId, status: i16) -> Job {
    let deadline = tokio::time::Instant::now() + WAIT_DEADLINE;
    loop {
        if let Some(job) = store.snapshot(id) {
            if job.status_id == status {
                return job;
            }
        }
        if tokio::time::Instant::now() > deadline {
            panic!("job {id} did not reach status {status} in time");
        }
        tokio::time::sleep(WAIT_POLL).await;
    }
}

/// Poll until `check` passes, panicking after a bounded wait.
pub async fn wait_until(mut check: impl FnMut() -> bool, what: &str) {
    let deadline = tokio::time::Instant::now() + WAIT_DEADLINE;
    while !check() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(WAIT_POLL).await;
    }
}

/// Minimal URL submission used by most tests.
pub fn url_submission() -> SubmitRequest {
    SubmitRequest {
        url: Some("https://cdn.example.com/audio/meeting.mp3".to_string()),
        ..SubmitRequest::default()
    }
}
