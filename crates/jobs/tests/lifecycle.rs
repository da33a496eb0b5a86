//! End-to-end lifecycle tests against real orchestrator wiring.
//!
//! Jobs flow submit -> dispatch -> claim -> transcribe -> terminal state
//! through the same components production uses; only the store, the
//! transcriber and the notifier are test doubles.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use hark_core::error::CoreError;
use hark_core::lifecycle::{
    STATUS_CANCELLED, STATUS_COMPLETED, STATUS_FAILED, STATUS_PENDING, STATUS_PROCESSING,
};
use hark_core::retry::LinearBackoff;
use hark_jobs::{
    dispatch_channel, DispatchError, JobSettings, Orchestrator, OrchestratorError,
    ProgressReporter, SubmitRequest,
};
use hark_notify::EventStatus;
use uuid::Uuid;

use common::{
    sample_transcript, start_harness, start_harness_with, test_settings, url_submission,
    wait_for_status, wait_until, FlakyTranscriber, GatedTranscriber, MemoryJobStore,
    RecordingNotifier,
};

// -- Happy path -------------------------------------------------------------

#[tokio::test]
async fn submitted_job_completes_with_transcription() {
    let harness = start_harness(Arc::new(FlakyTranscriber::succeeding())).await;

    let job = harness.orchestrator.submit(url_submission()).await.unwrap();
    assert_eq!(job.status_id, STATUS_PENDING);
    assert_eq!(job.progress, 0);

    let done = wait_for_status(&harness.store, job.id, STATUS_COMPLETED).await;
    assert_eq!(done.progress, 100);
    assert_eq!(
        done.transcription_text.as_deref(),
        Some("hello from the fixture")
    );
    assert!(done.result.is_some());
    assert_eq!(done.retry_count, 0);
    assert!(done.claimed_at.is_some());
    assert!(done.started_at.is_some());
    assert!(done.completed_at.is_some());
    // Terminal rows keep the winning attempt's token for audit.
    assert!(done.execution_token.is_some());

    harness.shutdown().await;
}

#[tokio::test]
async fn submission_applies_catalog_defaults() {
    let harness = start_harness(Arc::new(FlakyTranscriber::succeeding())).await;

    let job = harness.orchestrator.submit(url_submission()).await.unwrap();
    assert_eq!(job.engine, "faster-whisper");
    assert_eq!(job.model, "ivrit-ai/whisper-large-v3-turbo-ct2");
    assert_eq!(job.language, "he");
    assert!(!job.diarize);
    assert!(job.word_timestamps);

    wait_for_status(&harness.store, job.id, STATUS_COMPLETED).await;
    harness.shutdown().await;
}

#[tokio::test]
async fn jobs_without_a_webhook_notify_nobody() {
    let harness = start_harness(Arc::new(FlakyTranscriber::succeeding())).await;

    let job = harness.orchestrator.submit(url_submission()).await.unwrap();
    wait_for_status(&harness.store, job.id, STATUS_COMPLETED).await;

    let notifier = harness.notifier.clone();
    harness.shutdown().await;
    assert!(notifier.events().is_empty());
}

// -- Webhooks ---------------------------------------------------------------

#[tokio::test]
async fn webhooks_fire_in_lifecycle_order() {
    let harness = start_harness(Arc::new(FlakyTranscriber::succeeding())).await;

    let request = SubmitRequest {
        webhook_url: Some("https://hooks.example.com/jobs".to_string()),
        correlation_id: Some("rec_42".to_string()),
        ..url_submission()
    };
    let job = harness.orchestrator.submit(request).await.unwrap();
    wait_for_status(&harness.store, job.id, STATUS_COMPLETED).await;
    wait_until(|| harness.notifier.events().len() == 2, "both webhooks").await;

    let events = harness.notifier.events();
    assert_eq!(events[0].0, "https://hooks.example.com/jobs");
    assert_eq!(events[0].1.status, EventStatus::Processing);
    assert_eq!(events[0].1.correlation_id.as_deref(), Some("rec_42"));
    assert_eq!(events[1].1.status, EventStatus::Completed);
    assert_eq!(
        events[1].1.transcription.as_deref(),
        Some("hello from the fixture")
    );
    assert!(events[1].1.error.is_none());

    harness.shutdown().await;
}

#[tokio::test]
async fn webhook_failures_never_touch_job_state() {
    let harness = start_harness_with(
        Arc::new(FlakyTranscriber::succeeding()),
        RecordingNotifier::failing(),
        test_settings(),
    )
    .await;

    let request = SubmitRequest {
        webhook_url: Some("https://hooks.example.com/broken".to_string()),
        ..url_submission()
    };
    let job = harness.orchestrator.submit(request).await.unwrap();

    let done = wait_for_status(&harness.store, job.id, STATUS_COMPLETED).await;
    assert!(done.result.is_some());
    // Both deliveries were attempted and both failed; the job never noticed.
    wait_until(|| harness.notifier.events().len() == 2, "both webhooks").await;

    harness.shutdown().await;
}

// -- Retries ----------------------------------------------------------------

#[tokio::test]
async fn transient_failures_retry_until_success() {
    let transcriber = Arc::new(FlakyTranscriber::failing(2));
    let harness = start_harness(transcriber.clone()).await;

    let request = SubmitRequest {
        webhook_url: Some("https://hooks.example.com/jobs".to_string()),
        ..url_submission()
    };
    let job = harness.orchestrator.submit(request).await.unwrap();

    let done = wait_for_status(&harness.store, job.id, STATUS_COMPLETED).await;
    assert_eq!(done.retry_count, 2);
    assert_eq!(transcriber.calls(), 3);
    assert!(done.error_message.is_none());

    // One processing webhook per attempt, exactly one completed.
    wait_until(|| harness.notifier.events().len() == 4, "all webhooks").await;
    let statuses: Vec<EventStatus> = harness
        .notifier
        .events()
        .iter()
        .map(|(_, e)| e.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            EventStatus::Processing,
            EventStatus::Processing,
            EventStatus::Processing,
            EventStatus::Completed,
        ]
    );

    harness.shutdown().await;
}

#[tokio::test]
async fn exhausted_retries_fail_the_job() {
    let transcriber = Arc::new(FlakyTranscriber::failing(usize::MAX));
    let harness = start_harness(transcriber.clone()).await;

    let request = SubmitRequest {
        webhook_url: Some("https://hooks.example.com/jobs".to_string()),
        ..url_submission()
    };
    let job = harness.orchestrator.submit(request).await.unwrap();

    let done = wait_for_status(&harness.store, job.id, STATUS_FAILED).await;
    // Two requeues happened before the third failure went terminal.
    assert_eq!(done.retry_count, 2);
    assert_eq!(transcriber.calls(), 3);
    assert!(done
        .error_message
        .as_deref()
        .unwrap()
        .contains("engine crashed"));
    assert!(done.completed_at.is_some());

    wait_until(|| harness.notifier.events().len() == 4, "all webhooks").await;
    let last = harness.notifier.events().pop().unwrap();
    assert_eq!(last.1.status, EventStatus::Failed);
    assert!(last.1.error.as_deref().unwrap().contains("engine crashed"));

    harness.shutdown().await;
}

// -- Cancellation -----------------------------------------------------------

#[tokio::test]
async fn pending_jobs_cancel_before_running() {
    let transcriber = Arc::new(GatedTranscriber::new());
    let settings = JobSettings {
        worker_concurrency: 1,
        ..test_settings()
    };
    let harness =
        start_harness_with(transcriber.clone(), RecordingNotifier::new(), settings).await;

    // The first job occupies the only worker; the second stays queued.
    let running = harness.orchestrator.submit(url_submission()).await.unwrap();
    transcriber.entered().await;
    let queued = harness.orchestrator.submit(url_submission()).await.unwrap();

    assert!(harness.orchestrator.cancel(queued.id).await.unwrap());
    let cancelled = harness.store.snapshot(queued.id).unwrap();
    assert_eq!(cancelled.status_id, STATUS_CANCELLED);
    assert!(cancelled.completed_at.is_some());

    transcriber.release();
    wait_for_status(&harness.store, running.id, STATUS_COMPLETED).await;
    let store = harness.store.clone();
    harness.shutdown().await;

    // The cancelled job's dispatch died at the claim; it never ran.
    assert_eq!(transcriber.calls(), 1);
    assert_eq!(
        store.snapshot(queued.id).unwrap().status_id,
        STATUS_CANCELLED
    );
}

#[tokio::test]
async fn cancelling_a_processing_job_discards_the_late_result() {
    let transcriber = Arc::new(GatedTranscriber::new());
    let harness = start_harness_with(
        transcriber.clone(),
        RecordingNotifier::new(),
        test_settings(),
    )
    .await;

    let request = SubmitRequest {
        webhook_url: Some("https://hooks.example.com/jobs".to_string()),
        ..url_submission()
    };
    let job = harness.orchestrator.submit(request).await.unwrap();
    transcriber.entered().await;

    assert!(harness.orchestrator.cancel(job.id).await.unwrap());
    transcriber.release();
    let store = harness.store.clone();
    let notifier = harness.notifier.clone();
    harness.shutdown().await;

    let after = store.snapshot(job.id).unwrap();
    assert_eq!(after.status_id, STATUS_CANCELLED);
    assert!(after.result.is_none());
    assert!(after.transcription_text.is_none());

    // Processing was announced, completion never was.
    let statuses: Vec<EventStatus> = notifier.events().iter().map(|(_, e)| e.status).collect();
    assert_eq!(statuses, vec![EventStatus::Processing]);
}

#[tokio::test]
async fn cancelling_twice_reports_already_terminal() {
    let harness = start_harness(Arc::new(FlakyTranscriber::succeeding())).await;

    let job = harness.orchestrator.submit(url_submission()).await.unwrap();
    wait_for_status(&harness.store, job.id, STATUS_COMPLETED).await;

    assert!(!harness.orchestrator.cancel(job.id).await.unwrap());
    assert_eq!(
        harness.store.snapshot(job.id).unwrap().status_id,
        STATUS_COMPLETED
    );

    harness.shutdown().await;
}

#[tokio::test]
async fn cancelling_an_unknown_job_is_not_found() {
    let harness = start_harness(Arc::new(FlakyTranscriber::succeeding())).await;

    let err = harness.orchestrator.cancel(Uuid::new_v4()).await.unwrap_err();
    assert_matches!(
        err,
        OrchestratorError::Core(CoreError::NotFound { entity: "job", .. })
    );

    harness.shutdown().await;
}

// -- Stale attempts ---------------------------------------------------------

#[tokio::test]
async fn a_stale_token_cannot_complete_the_job() {
    let transcriber = Arc::new(GatedTranscriber::new());
    let harness = start_harness_with(
        transcriber.clone(),
        RecordingNotifier::new(),
        test_settings(),
    )
    .await;

    let job = harness.orchestrator.submit(url_submission()).await.unwrap();
    transcriber.entered().await;

    // A forged token is indistinguishable from a superseded attempt's.
    harness
        .orchestrator
        .complete(job.id, Uuid::new_v4(), &sample_transcript())
        .await
        .unwrap();
    let mid = harness.store.snapshot(job.id).unwrap();
    assert_eq!(mid.status_id, STATUS_PROCESSING);
    assert!(mid.result.is_none());

    // The real attempt still owns the job and lands normally.
    transcriber.release();
    wait_for_status(&harness.store, job.id, STATUS_COMPLETED).await;
    harness.shutdown().await;
}

// -- Progress ---------------------------------------------------------------

#[tokio::test]
async fn progress_reports_persist_while_processing() {
    let transcriber = Arc::new(GatedTranscriber::new());
    let harness = start_harness_with(
        transcriber.clone(),
        RecordingNotifier::new(),
        test_settings(),
    )
    .await;

    let job = harness.orchestrator.submit(url_submission()).await.unwrap();
    transcriber.entered().await;

    harness.orchestrator.report_progress(job.id, 40);
    wait_until(
        || harness.store.snapshot(job.id).unwrap().progress == 40,
        "progress to persist",
    )
    .await;

    // Out-of-range reports clamp instead of erroring.
    harness.orchestrator.report_progress(job.id, 250);
    wait_until(
        || harness.store.snapshot(job.id).unwrap().progress == 100,
        "clamped progress",
    )
    .await;
    assert_eq!(
        harness.store.snapshot(job.id).unwrap().status_id,
        STATUS_PROCESSING
    );

    transcriber.release();
    let done = wait_for_status(&harness.store, job.id, STATUS_COMPLETED).await;
    assert_eq!(done.progress, 100);
    harness.shutdown().await;
}

#[tokio::test]
async fn lower_progress_reports_never_regress() {
    let transcriber = Arc::new(GatedTranscriber::new());
    let harness = start_harness_with(
        transcriber.clone(),
        RecordingNotifier::new(),
        test_settings(),
    )
    .await;

    // Two jobs held in Processing; reports for the second double as a fence
    // proving the single consumer already applied everything queued before
    // them for the first.
    let first = harness.orchestrator.submit(url_submission()).await.unwrap();
    transcriber.entered().await;
    let second = harness.orchestrator.submit(url_submission()).await.unwrap();
    transcriber.entered().await;

    harness.orchestrator.report_progress(first.id, 40);
    wait_until(
        || harness.store.snapshot(first.id).unwrap().progress == 40,
        "first progress to persist",
    )
    .await;

    harness.orchestrator.report_progress(first.id, 25);
    harness.orchestrator.report_progress(second.id, 77);
    wait_until(
        || harness.store.snapshot(second.id).unwrap().progress == 77,
        "fence progress to persist",
    )
    .await;

    // The 25 was applied (the fence came after it) and changed nothing.
    assert_eq!(harness.store.snapshot(first.id).unwrap().progress, 40);

    transcriber.release();
    transcriber.release();
    wait_for_status(&harness.store, first.id, STATUS_COMPLETED).await;
    wait_for_status(&harness.store, second.id, STATUS_COMPLETED).await;
    harness.shutdown().await;
}

#[tokio::test]
async fn progress_after_completion_is_dropped() {
    let harness = start_harness(Arc::new(FlakyTranscriber::succeeding())).await;

    let job = harness.orchestrator.submit(url_submission()).await.unwrap();
    wait_for_status(&harness.store, job.id, STATUS_COMPLETED).await;

    harness.orchestrator.report_progress(job.id, 10);
    let store = harness.store.clone();
    harness.shutdown().await;

    // Shutdown drained the progress pipeline; the late report was dropped
    // by the store's processing guard.
    assert_eq!(store.snapshot(job.id).unwrap().progress, 100);
}

// -- Validation -------------------------------------------------------------

#[tokio::test]
async fn submissions_need_exactly_one_audio_source() {
    let harness = start_harness(Arc::new(FlakyTranscriber::succeeding())).await;

    let none = SubmitRequest::default();
    assert_matches!(
        harness.orchestrator.submit(none).await.unwrap_err(),
        OrchestratorError::Core(CoreError::Validation(_))
    );

    let both = SubmitRequest {
        audio_path: Some("/data/uploads/a.mp3".to_string()),
        ..url_submission()
    };
    assert_matches!(
        harness.orchestrator.submit(both).await.unwrap_err(),
        OrchestratorError::Core(CoreError::Validation(_))
    );

    assert!(harness.store.all().is_empty());
    harness.shutdown().await;
}

#[tokio::test]
async fn submissions_reject_unknown_engines() {
    let harness = start_harness(Arc::new(FlakyTranscriber::succeeding())).await;

    let request = SubmitRequest {
        engine: Some("wav2vec".to_string()),
        ..url_submission()
    };
    let err = harness.orchestrator.submit(request).await.unwrap_err();
    assert_matches!(err, OrchestratorError::Core(CoreError::Validation(ref m)) if m.contains("wav2vec"));

    harness.shutdown().await;
}

#[tokio::test]
async fn submissions_reject_non_http_urls() {
    let harness = start_harness(Arc::new(FlakyTranscriber::succeeding())).await;

    let audio = SubmitRequest {
        url: Some("ftp://cdn.example.com/audio.mp3".to_string()),
        ..SubmitRequest::default()
    };
    assert_matches!(
        harness.orchestrator.submit(audio).await.unwrap_err(),
        OrchestratorError::Core(CoreError::Validation(_))
    );

    let webhook = SubmitRequest {
        webhook_url: Some("not a url".to_string()),
        ..url_submission()
    };
    assert_matches!(
        harness.orchestrator.submit(webhook).await.unwrap_err(),
        OrchestratorError::Core(CoreError::Validation(_))
    );

    harness.shutdown().await;
}

// -- Dispatch failure -------------------------------------------------------

#[tokio::test]
async fn a_full_queue_leaves_the_job_pending() {
    let store = Arc::new(MemoryJobStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let (progress, progress_task) = ProgressReporter::start(store.clone());
    // Capacity one and no workers draining it.
    let (handle, _queue) = dispatch_channel(1);
    let orchestrator = Orchestrator::new(
        store.clone(),
        notifier,
        Arc::new(LinearBackoff::new(Duration::from_millis(2))),
        handle,
        progress,
        test_settings(),
    );

    let first = orchestrator.submit(url_submission()).await.unwrap();
    let err = orchestrator.submit(url_submission()).await.unwrap_err();
    assert_matches!(err, OrchestratorError::Dispatch(DispatchError::QueueFull));

    // The second job was persisted before dispatch failed and is still
    // pending, ready for a later dispatch.
    let stranded: Vec<_> = store
        .all()
        .into_iter()
        .filter(|j| j.id != first.id)
        .collect();
    assert_eq!(stranded.len(), 1);
    assert_eq!(stranded[0].status_id, STATUS_PENDING);

    drop(orchestrator);
    let _ = progress_task.await;
}
