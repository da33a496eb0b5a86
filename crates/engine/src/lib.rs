//! Transcription engine boundary.
//!
//! [`Transcriber`] is the seam between job orchestration and actual speech
//! recognition. The production implementation, [`HttpTranscriber`], talks to
//! an inference sidecar over HTTP; orchestrator tests substitute scripted
//! implementations. The [`catalog`] module describes the engines and models
//! the service advertises.

pub mod catalog;
pub mod http;
pub mod transcriber;
pub mod types;

pub use catalog::{EngineKind, ModelInfo};
pub use http::HttpTranscriber;
pub use transcriber::{ProgressSink, Transcriber, TranscriptionError};
pub use types::{AudioSource, Segment, TranscribeRequest, Transcript};
