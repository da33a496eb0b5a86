//! The webhook payload and its three event kinds.

use serde::Serialize;

/// Lifecycle moments that produce a webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// A worker picked the job up.
    Processing,
    /// The job finished with a transcription.
    Completed,
    /// The job exhausted its attempts or timed out.
    Failed,
}

/// JSON body delivered to the job's webhook URL.
///
/// Field order is the wire order. `correlation_id` is always present (null
/// when the submission carried none) so receivers can route on it without
/// probing; `transcription` and `error` only appear on the event kind that
/// defines them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobEvent {
    pub correlation_id: Option<String>,
    pub status: EventStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobEvent {
    /// Event for a successful claim. Retried jobs send one per attempt.
    pub fn processing(correlation_id: Option<String>) -> Self {
        Self {
            correlation_id,
            status: EventStatus::Processing,
            transcription: None,
            error: None,
        }
    }

    /// Event for a completed job, carrying the plain transcription text.
    pub fn completed(correlation_id: Option<String>, transcription: String) -> Self {
        Self {
            correlation_id,
            status: EventStatus::Completed,
            transcription: Some(transcription),
            error: None,
        }
    }

    /// Event for a failed job, carrying the final error message.
    pub fn failed(correlation_id: Option<String>, error: String) -> Self {
        Self {
            correlation_id,
            status: EventStatus::Failed,
            transcription: None,
            error: Some(error),
        }
    }
}
