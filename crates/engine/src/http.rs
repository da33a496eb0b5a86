//! HTTP client for the transcription inference sidecar.
//!
//! The sidecar exposes `POST /transcribe`: it fetches or reads the audio,
//! runs the requested engine, and answers with a [`Transcript`] JSON body.
//! The client reports two coarse progress marks around the call; anything
//! finer-grained has to come from the engine itself.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::transcriber::{ProgressSink, Transcriber, TranscriptionError};
use crate::types::{AudioSource, TranscribeRequest, Transcript};

/// Progress reported once the request is on the wire.
const PROGRESS_DISPATCHED: i16 = 10;

/// Progress reported once the engine answered with a success status.
const PROGRESS_RECEIVED: i16 = 90;

/// Connect timeout for reaching the sidecar. There is deliberately no
/// overall request timeout: long inputs legitimately transcribe for many
/// minutes, and hung attempts are bounded by the job watchdog instead.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of `POST /transcribe`.
#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    engine: &'a str,
    model: &'a str,
    language: &'a str,
    diarize: bool,
    word_timestamps: bool,
}

/// [`Transcriber`] talking to an inference sidecar over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTranscriber {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTranscriber {
    /// `base_url` points at the sidecar, e.g. `http://127.0.0.1:8090`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(
        &self,
        request: &TranscribeRequest,
        progress: ProgressSink,
    ) -> Result<Transcript, TranscriptionError> {
        let (url, path) = match &request.source {
            AudioSource::Url(url) => (Some(url.as_str()), None),
            AudioSource::File(path) => (None, Some(path.to_string_lossy().into_owned())),
        };
        let body = WireRequest {
            url,
            path,
            engine: request.engine.as_str(),
            model: &request.model,
            language: &request.language,
            diarize: request.diarize,
            word_timestamps: request.word_timestamps,
        };

        progress.report(PROGRESS_DISPATCHED);
        let response = self
            .client
            .post(format!("{}/transcribe", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::ApiError(format!(
                "HTTP {status}: {detail}"
            )));
        }

        let transcript: Transcript = response
            .json()
            .await
            .map_err(|e| TranscriptionError::ParseError(e.to_string()))?;
        progress.report(PROGRESS_RECEIVED);

        if transcript.text.trim().is_empty() && transcript.segments.is_empty() {
            return Err(TranscriptionError::EmptyResponse);
        }
        Ok(transcript)
    }
}
