//! Engine and model catalog advertised by the service.
//!
//! The catalog is advisory: callers may submit any model string their
//! deployment serves, but these are the combinations the service documents
//! and defaults to.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Default engine used when a submission does not name one.
pub const DEFAULT_ENGINE: EngineKind = EngineKind::FasterWhisper;

/// Default model used when a submission does not name one.
pub const DEFAULT_MODEL: &str = "ivrit-ai/whisper-large-v3-turbo-ct2";

/// Default language hint used when a submission does not name one.
pub const DEFAULT_LANGUAGE: &str = "he";

/// Speech recognition engines the inference sidecar can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    FasterWhisper,
    StableWhisper,
}

impl EngineKind {
    /// Wire name for the engine, as accepted in submissions.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FasterWhisper => "faster-whisper",
            Self::StableWhisper => "stable-whisper",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized engine names.
#[derive(Debug, thiserror::Error)]
#[error("Unknown engine '{0}'. Valid engines: faster-whisper, stable-whisper")]
pub struct UnknownEngine(pub String);

impl FromStr for EngineKind {
    type Err = UnknownEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "faster-whisper" => Ok(Self::FasterWhisper),
            "stable-whisper" => Ok(Self::StableWhisper),
            other => Err(UnknownEngine(other.to_string())),
        }
    }
}

/// One advertised engine/model combination.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub engine: EngineKind,
    pub language: &'static str,
    pub description: &'static str,
}

/// Models advertised by `GET /api/v1/models`.
pub const MODELS: [ModelInfo; 3] = [
    ModelInfo {
        id: "ivrit-ai/whisper-large-v3-turbo-ct2",
        name: "Hebrew Optimized (Turbo)",
        engine: EngineKind::FasterWhisper,
        language: "he",
        description: "Optimized Hebrew transcription model (fastest)",
    },
    ModelInfo {
        id: "ivrit-ai/whisper-large-v3-ct2",
        name: "Hebrew Accurate",
        engine: EngineKind::FasterWhisper,
        language: "he",
        description: "High-accuracy Hebrew transcription model",
    },
    ModelInfo {
        id: "large-v3-turbo",
        name: "Multilingual (Turbo)",
        engine: EngineKind::FasterWhisper,
        language: "auto",
        description: "Fast multilingual transcription",
    },
];
