//! Gracy Core Library
//!
//! Ideas, scripts and metadata for the "Miss Gracy Baby" channel, generated
//! with an AI text service, gated by deterministic quality rules and rendered
//! into a narrated slideshow video.

pub mod artifacts;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod ideas;
pub mod media;
pub mod metadata;
pub mod provider;
pub mod quality;
pub mod report;
pub mod script;
pub mod templates;
pub mod types;
pub mod workflow;

// Re-export commonly used items at crate root
pub use artifacts::{default_output_root, load_json, new_run_id};
pub use client::{ChatClient, ClientError, CompletionRequest, TextGenerator};
pub use config::StudioConfig;
pub use error::{MediaStage, Result, Stage, StudioError};
pub use format::{
    format_idea_readable, format_metadata_readable, format_quality_report,
    format_script_readable, format_timestamp, format_video_summary,
};
pub use ideas::{IdeaGenerator, PillarChoice};
pub use media::{
    EncodeJob, ImageSource, MediaAssembler, MediaConfig, SpeechSynthesizer, VideoEncoder,
};
pub use metadata::MetadataGenerator;
pub use provider::{Provider, ProviderConfig, ProviderError};
pub use quality::evaluate;
pub use report::{RunReport, StepTiming};
pub use script::{ScriptGenerator, parse_script};
pub use templates::{
    CallToAction, PillarTemplate, QualityThresholds, SectionBounds, TemplateStore, WordBounds,
};
pub use types::{ContentIdea, Grade, Metadata, QualityReport, Script, Section, VideoArtifact};
pub use workflow::{
    NoProgress, Progress, RunArtifacts, ScriptSource, StageEvent, Studio, StudioOptions,
    WorkflowOutcome, load_idea, load_script,
};
