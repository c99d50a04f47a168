use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ClientError;

/// Pipeline stage an error or progress event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Idea,
    Script,
    Quality,
    Metadata,
    Media,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Idea => "idea",
            Stage::Script => "script",
            Stage::Quality => "quality",
            Stage::Metadata => "metadata",
            Stage::Media => "media",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaStage {
    Speech,
    Images,
    Encode,
}

impl fmt::Display for MediaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MediaStage::Speech => "speech",
            MediaStage::Images => "images",
            MediaStage::Encode => "encode",
        })
    }
}

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("{stage}: generation failed: {reason}")]
    Generation { stage: Stage, reason: String },

    #[error("{stage}: response is missing required structure: {reason}")]
    Parse { stage: Stage, reason: String },

    #[error(
        "quality: gate still failing after {attempts} attempts: {}",
        violations.join("; ")
    )]
    QualityGateExhausted {
        attempts: u32,
        violations: Vec<String>,
    },

    #[error("media: {stage} failed: {reason}")]
    Media { stage: MediaStage, reason: String },

    /// A video was requested but no speech, image or encode backends were set up
    #[error("media: no media backends configured")]
    MediaNotConfigured,

    #[error("{stage}: AI request failed: {source}")]
    Request {
        stage: Stage,
        #[source]
        source: ClientError,
    },

    #[error("Unknown pillar: {0}")]
    UnknownPillar(String),

    #[error("Invalid configuration in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl StudioError {
    /// Map a text-client failure to the taxonomy: bad payloads are generation
    /// errors, transport and credential problems keep their source.
    pub fn from_client(stage: Stage, err: ClientError) -> Self {
        match err {
            ClientError::Empty | ClientError::InvalidResponse(_) => StudioError::Generation {
                stage,
                reason: err.to_string(),
            },
            other => StudioError::Request {
                stage,
                source: other,
            },
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            StudioError::Generation { stage, .. }
            | StudioError::Parse { stage, .. }
            | StudioError::Request { stage, .. } => Some(*stage),
            StudioError::QualityGateExhausted { .. } => Some(Stage::Quality),
            StudioError::Media { .. } | StudioError::MediaNotConfigured => Some(Stage::Media),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_error_names_failing_stage() {
        let err = StudioError::Media {
            stage: MediaStage::Encode,
            reason: "ffmpeg exited with 1".into(),
        };
        assert_eq!(err.to_string(), "media: encode failed: ffmpeg exited with 1");
        assert_eq!(err.stage(), Some(Stage::Media));
    }

    #[test]
    fn empty_client_response_is_a_generation_error() {
        let err = StudioError::from_client(Stage::Metadata, ClientError::Empty);
        assert!(matches!(
            err,
            StudioError::Generation {
                stage: Stage::Metadata,
                ..
            }
        ));
    }
}
