//! Webhook delivery with fixed-delay retry and payload signing.
//!
//! [`WebhookNotifier`] sends a JSON-encoded [`JobEvent`] to an external URL
//! via HTTP POST. The payload is serialized exactly once; when a signing
//! secret is configured, the HMAC covers those bytes and the same bytes go
//! on the wire. Failed attempts are retried with a fixed delay, and
//! exhaustion is logged but never propagated into job state by callers.

use std::time::Duration;

use async_trait::async_trait;
use hark_core::metric_names::METRIC_WEBHOOK_DELIVERIES;
use hark_core::signing::{compute_webhook_hmac, SIGNATURE_HEADER};
use reqwest::header::CONTENT_TYPE;

use crate::event::JobEvent;

/// Total delivery attempts per event.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between consecutive attempts.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),

    /// The event could not be encoded as JSON.
    #[error("Failed to encode webhook payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables for webhook delivery.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// HMAC signing secret. No signature header is sent when absent.
    pub secret: Option<String>,
    /// Total attempts per event, including the first.
    pub max_attempts: u32,
    /// Timeout for each individual POST.
    pub request_timeout: Duration,
    /// Pause between consecutive attempts.
    pub retry_delay: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            request_timeout: REQUEST_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

// ---------------------------------------------------------------------------
// Notifier seam
// ---------------------------------------------------------------------------

/// Delivery seam the orchestrator emits events through.
///
/// Production wires in [`WebhookNotifier`]; orchestrator tests record events
/// instead of sending HTTP.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, url: &str, event: &JobEvent) -> Result<(), NotifyError>;
}

// ---------------------------------------------------------------------------
// WebhookNotifier
// ---------------------------------------------------------------------------

/// Delivers job events to external webhook endpoints.
pub struct WebhookNotifier {
    client: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookNotifier {
    /// Create a new notifier with a pre-configured HTTP client.
    pub fn new(config: WebhookConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, config }
    }

    /// Deliver an event to a webhook URL with retry.
    ///
    /// Returns `Ok(())` on the first successful attempt.
    pub async fn deliver(&self, url: &str, event: &JobEvent) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(event)?;
        self.deliver_payload(url, payload).await
    }

    /// Deliver a pre-serialized JSON payload with signing and retry.
    ///
    /// Also used by the webhook test endpoint so ad-hoc payloads go through
    /// the exact signing path receivers will verify in production.
    pub async fn deliver_payload(&self, url: &str, payload: String) -> Result<(), NotifyError> {
        let signature = self
            .config
            .secret
            .as_deref()
            .map(|secret| compute_webhook_hmac(secret, &payload));

        let mut attempt = 1;
        let attempts = self.config.max_attempts.max(1);
        loop {
            match self.try_send(url, &payload, signature.as_deref()).await {
                Ok(()) => {
                    metrics::counter!(METRIC_WEBHOOK_DELIVERIES, "status" => "delivered")
                        .increment(1);
                    return Ok(());
                }
                Err(e) if attempt >= attempts => {
                    metrics::counter!(METRIC_WEBHOOK_DELIVERIES, "status" => "failed").increment(1);
                    tracing::error!(url, error = %e, "Webhook delivery failed after all retries");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        url,
                        error = %e,
                        "Webhook delivery attempt failed, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            }
        }
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(
        &self,
        url: &str,
        payload: &str,
        signature: Option<&str>,
    ) -> Result<(), NotifyError> {
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_string());
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

impl Default for WebhookNotifier {
    fn default() -> Self {
        Self::new(WebhookConfig::default())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, url: &str, event: &JobEvent) -> Result<(), NotifyError> {
        self.deliver(url, event).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
