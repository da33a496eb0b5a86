//! Audio input descriptions and transcription results.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalog::EngineKind;

/// Audio container formats accepted for upload and remote fetch.
pub const SUPPORTED_AUDIO_FORMATS: [&str; 6] = ["mp3", "wav", "m4a", "flac", "ogg", "webm"];

/// Lowercased file extension of `filename`, if it has one.
pub fn audio_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Whether `ext` (case-insensitive) is a supported audio format.
pub fn is_supported_format(ext: &str) -> bool {
    SUPPORTED_AUDIO_FORMATS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(ext))
}

/// Where the audio for a job lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Fetchable URL, passed through to the engine.
    Url(String),
    /// Path on storage shared with the engine (uploaded files).
    File(PathBuf),
}

/// Everything the engine needs to transcribe one piece of audio.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    pub source: AudioSource,
    pub engine: EngineKind,
    pub model: String,
    pub language: String,
    pub diarize: bool,
    pub word_timestamps: bool,
}

/// One recognized span of speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: i32,
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds.
    pub end: f64,
    pub text: String,
    /// Speaker label when diarization ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// Per-word timing payload when word timestamps were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<serde_json::Value>,
}

/// Full result of a transcription attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub language: String,
    /// Audio duration in seconds as reported by the engine.
    pub duration: f64,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// The transcription as one plain string.
    ///
    /// Prefers the engine's own `text` field; falls back to joining segment
    /// texts for engines that only emit segments.
    pub fn plain_text(&self) -> String {
        let text = self.text.trim();
        if !text.is_empty() {
            return text.to_string();
        }
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
