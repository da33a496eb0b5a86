//! The transcriber seam and its error taxonomy.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{TranscribeRequest, Transcript};

/// Error from a single transcription attempt.
///
/// All variants are treated as attempt failures by the orchestrator; whether
/// the job gets another attempt is the retry policy's call, not the
/// engine's.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TranscriptionError {
    /// The request never produced an HTTP response (connect failure, broken
    /// transfer).
    #[error("Transcription request failed: {0}")]
    RequestFailed(String),

    /// The engine answered with a non-success status.
    #[error("Transcription service error: {0}")]
    ApiError(String),

    /// The response body was not a valid transcript.
    #[error("Failed to parse transcription response: {0}")]
    ParseError(String),

    /// The engine returned neither text nor segments.
    #[error("Transcription service returned an empty result")]
    EmptyResponse,
}

/// Callback handle a transcriber uses to report coarse progress.
///
/// Reports are fire-and-forget; a sink must never block or fail the attempt.
#[derive(Clone)]
pub struct ProgressSink {
    callback: Option<Arc<dyn Fn(i16) + Send + Sync>>,
}

impl ProgressSink {
    /// Sink that forwards each report to `callback`.
    pub fn new(callback: impl Fn(i16) + Send + Sync + 'static) -> Self {
        Self {
            callback: Some(Arc::new(callback)),
        }
    }

    /// Sink that drops every report. Useful in tests and one-off calls.
    pub fn disabled() -> Self {
        Self { callback: None }
    }

    /// Report completion of roughly `percent` of the attempt.
    pub fn report(&self, percent: i16) {
        if let Some(callback) = &self.callback {
            callback(percent);
        }
    }
}

impl fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressSink")
            .field("enabled", &self.callback.is_some())
            .finish()
    }
}

/// Turns audio into text. One call is one attempt.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        request: &TranscribeRequest,
        progress: ProgressSink,
    ) -> Result<Transcript, TranscriptionError>;
}
