//! Tunables shared by the orchestrator, dispatcher and watchdog.

use std::time::Duration;

use hark_core::retry::DEFAULT_MAX_RETRIES;

/// Default number of workers pulling from the dispatch queue.
pub const DEFAULT_WORKER_CONCURRENCY: usize = 4;

/// Default dispatch queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default hard ceiling on a single processing attempt.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(3600);

/// Default pause between watchdog sweeps.
pub const DEFAULT_WATCHDOG_INTERVAL: Duration = Duration::from_secs(60);

/// Runtime configuration for the orchestration layer.
#[derive(Debug, Clone)]
pub struct JobSettings {
    /// Ceiling on failed attempts before a job is marked failed.
    pub max_retries: i32,
    /// Workers pulling from the dispatch queue.
    pub worker_concurrency: usize,
    /// Dispatch queue capacity. Submissions fail fast when it is full.
    pub queue_capacity: usize,
    /// Processing attempts claimed longer ago than this get force-failed.
    pub job_timeout: Duration,
    /// Pause between watchdog sweeps.
    pub watchdog_interval: Duration,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            worker_concurrency: DEFAULT_WORKER_CONCURRENCY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            job_timeout: DEFAULT_JOB_TIMEOUT,
            watchdog_interval: DEFAULT_WATCHDOG_INTERVAL,
        }
    }
}
