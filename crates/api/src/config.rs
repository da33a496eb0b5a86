use std::path::PathBuf;
use std::time::Duration;

use hark_jobs::JobSettings;
use hark_notify::WebhookConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Base URL of the transcription engine sidecar.
    pub transcriber_url: String,
    /// Directory uploaded audio files are stored in.
    pub upload_dir: PathBuf,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
    /// Job execution tunables (retries, concurrency, timeouts).
    pub jobs: JobSettings,
    /// Webhook delivery tunables (signing secret, retry schedule).
    pub webhook: WebhookConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                   |
    /// |-----------------------------|---------------------------|
    /// | `HOST`                      | `0.0.0.0`                 |
    /// | `PORT`                      | `8000`                    |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`   |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                      |
    /// | `TRANSCRIBER_URL`           | `http://localhost:8081`   |
    /// | `UPLOAD_DIR`                | `data/uploads`            |
    /// | `MAX_UPLOAD_BYTES`          | `524288000` (500 MB)      |
    /// | `MAX_RETRY_ATTEMPTS`        | `3`                       |
    /// | `WORKER_CONCURRENCY`        | `4`                       |
    /// | `QUEUE_CAPACITY`            | `256`                     |
    /// | `JOB_TIMEOUT_SECS`          | `3600`                    |
    /// | `WATCHDOG_INTERVAL_SECS`    | `60`                      |
    /// | `WEBHOOK_SECRET`            | unset (unsigned webhooks) |
    /// | `WEBHOOK_MAX_ATTEMPTS`      | `3`                       |
    /// | `WEBHOOK_TIMEOUT_SECS`      | `10`                      |
    /// | `WEBHOOK_RETRY_DELAY_SECS`  | `1`                       |
    ///
    /// `DATABASE_URL` is read separately by the binary entrypoints.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let transcriber_url =
            std::env::var("TRANSCRIBER_URL").unwrap_or_else(|_| "http://localhost:8081".into());

        let upload_dir: PathBuf = std::env::var("UPLOAD_DIR")
            .unwrap_or_else(|_| "data/uploads".into())
            .into();

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| "524288000".into())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            transcriber_url,
            upload_dir,
            max_upload_bytes,
            jobs: job_settings_from_env(),
            webhook: webhook_config_from_env(),
        }
    }
}

/// Load job execution tunables from environment variables.
fn job_settings_from_env() -> JobSettings {
    let defaults = JobSettings::default();

    let max_retries: i32 = std::env::var("MAX_RETRY_ATTEMPTS")
        .unwrap_or_else(|_| defaults.max_retries.to_string())
        .parse()
        .expect("MAX_RETRY_ATTEMPTS must be a valid i32");

    let worker_concurrency: usize = std::env::var("WORKER_CONCURRENCY")
        .unwrap_or_else(|_| defaults.worker_concurrency.to_string())
        .parse()
        .expect("WORKER_CONCURRENCY must be a valid usize");

    let queue_capacity: usize = std::env::var("QUEUE_CAPACITY")
        .unwrap_or_else(|_| defaults.queue_capacity.to_string())
        .parse()
        .expect("QUEUE_CAPACITY must be a valid usize");

    let job_timeout_secs: u64 = std::env::var("JOB_TIMEOUT_SECS")
        .unwrap_or_else(|_| defaults.job_timeout.as_secs().to_string())
        .parse()
        .expect("JOB_TIMEOUT_SECS must be a valid u64");

    let watchdog_interval_secs: u64 = std::env::var("WATCHDOG_INTERVAL_SECS")
        .unwrap_or_else(|_| defaults.watchdog_interval.as_secs().to_string())
        .parse()
        .expect("WATCHDOG_INTERVAL_SECS must be a valid u64");

    JobSettings {
        max_retries,
        worker_concurrency,
        queue_capacity,
        job_timeout: Duration::from_secs(job_timeout_secs),
        watchdog_interval: Duration::from_secs(watchdog_interval_secs),
    }
}

/// Load webhook delivery tunables from environment variables.
fn webhook_config_from_env() -> WebhookConfig {
    let defaults = WebhookConfig::default();

    let secret = std::env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());

    let max_attempts: u32 = std::env::var("WEBHOOK_MAX_ATTEMPTS")
        .unwrap_or_else(|_| defaults.max_attempts.to_string())
        .parse()
        .expect("WEBHOOK_MAX_ATTEMPTS must be a valid u32");

    let request_timeout_secs: u64 = std::env::var("WEBHOOK_TIMEOUT_SECS")
        .unwrap_or_else(|_| defaults.request_timeout.as_secs().to_string())
        .parse()
        .expect("WEBHOOK_TIMEOUT_SECS must be a valid u64");

    let retry_delay_secs: u64 = std::env::var("WEBHOOK_RETRY_DELAY_SECS")
        .unwrap_or_else(|_| defaults.retry_delay.as_secs().to_string())
        .parse()
        .expect("WEBHOOK_RETRY_DELAY_SECS must be a valid u64");

    WebhookConfig {
        secret,
        max_attempts,
        request_timeout: Duration::from_secs(request_timeout_secs),
        retry_delay: Duration::from_secs(retry_delay_secs),
    }
}
