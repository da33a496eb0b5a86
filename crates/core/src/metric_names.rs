//! Canonical Prometheus metric names.
//!
//! These names are registered by the API server's recorder and emitted from
//! the orchestrator, dispatcher and watchdog. Keeping them in `core` means
//! the emitting crates and the exporter agree on spelling.

/// Counter: jobs accepted by the submit endpoint.
pub const METRIC_JOBS_SUBMITTED: &str = "hark_jobs_submitted_total";

/// Counter: jobs that reached Completed.
pub const METRIC_JOBS_COMPLETED: &str = "hark_jobs_completed_total";

/// Counter: jobs that reached Failed, including watchdog timeouts.
pub const METRIC_JOBS_FAILED: &str = "hark_jobs_failed_total";

/// Counter: jobs cancelled by callers.
pub const METRIC_JOBS_CANCELLED: &str = "hark_jobs_cancelled_total";

/// Histogram: wall time from submission to terminal state, in seconds.
pub const METRIC_JOB_DURATION_SECONDS: &str = "hark_job_duration_seconds";

/// Histogram: wall time spent inside the transcription engine, in seconds.
pub const METRIC_TRANSCRIPTION_DURATION_SECONDS: &str = "hark_transcription_duration_seconds";

/// Gauge: jobs sitting in the dispatch queue.
pub const METRIC_QUEUE_DEPTH: &str = "hark_queue_depth";

/// Gauge: workers currently running a transcription attempt.
pub const METRIC_ACTIVE_WORKERS: &str = "hark_active_workers";

/// Counter: webhook delivery outcomes, labeled by `status`
/// (`delivered` / `failed`).
pub const METRIC_WEBHOOK_DELIVERIES: &str = "hark_webhook_deliveries_total";
