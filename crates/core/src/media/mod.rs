//! Voiceover, stills and the final encode. Each step sits behind a trait so
//! the assembler can run against fakes; the default backends talk to an
//! OpenAI-compatible API and shell out to `ffmpeg`.

mod encode;
mod images;
mod speech;

use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};

pub use encode::FfmpegEncoder;
pub use images::OpenAiImages;
pub use speech::OpenAiSpeech;

use crate::{
    client::ClientError,
    error::{MediaStage, Result, Stage, StudioError},
    provider::Provider,
    types::{Metadata, Script, VideoArtifact, word_count},
};

/// Text to speech; returns a complete WAV file
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> anyhow::Result<Vec<u8>>;
}

/// One still image per prompt; returns encoded image bytes (PNG)
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, prompt: &str) -> anyhow::Result<Vec<u8>>;
}

pub struct EncodeJob {
    pub concat_list: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
}

#[async_trait]
pub trait VideoEncoder: Send + Sync {
    async fn encode(&self, job: &EncodeJob) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Base URL of the OpenAI-compatible media API
    pub base_url: String,
    /// Falls back to `OPENAI_API_KEY`
    pub api_key: Option<String>,
    pub tts_model: String,
    pub voice: String,
    pub image_model: String,
    pub image_size: String,
    pub ffmpeg: PathBuf,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            tts_model: "tts-1".to_string(),
            voice: "nova".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1792x1024".to_string(),
            ffmpeg: PathBuf::from("ffmpeg"),
            fps: 24,
            width: 1280,
            height: 720,
        }
    }
}

/// Split `total_seconds` across segments in proportion to their word counts.
/// All-zero counts share the time equally.
pub fn segment_durations(word_counts: &[usize], total_seconds: f64) -> Vec<f64> {
    if word_counts.is_empty() {
        return Vec::new();
    }
    let total_words: usize = word_counts.iter().sum();
    if total_words == 0 {
        let share = total_seconds / word_counts.len() as f64;
        return vec![share; word_counts.len()];
    }
    word_counts
        .iter()
        .map(|&w| total_seconds * w as f64 / total_words as f64)
        .collect()
}

/// Playback length of a WAV file. Streamed WAVs may carry a placeholder data
/// length, so the header is capped by what the bytes can actually hold.
pub fn wav_duration(bytes: &[u8]) -> anyhow::Result<f64> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).context("not a readable WAV file")?;
    let spec = reader.spec();
    let byte_rate = spec.sample_rate as f64 * spec.channels as f64 * (spec.bits_per_sample as f64 / 8.0);
    anyhow::ensure!(byte_rate > 0.0, "WAV header has a zero byte rate");

    let from_header = reader.duration() as f64 / spec.sample_rate as f64;
    let from_size = bytes.len() as f64 / byte_rate;
    Ok(from_header.min(from_size))
}

/// Body of an ffmpeg concat-demuxer list. ffmpeg resolves relative entries
/// against the list's own directory, so entries are file names of stills
/// sitting next to the list. The last image is repeated so its duration is
/// honoured.
pub fn concat_list(entries: &[(String, f64)]) -> String {
    let mut list = String::from("ffconcat version 1.0\n");
    for (name, seconds) in entries {
        list.push_str(&format!("file '{}'\nduration {:.3}\n", quote(name), seconds));
    }
    if let Some((last, _)) = entries.last() {
        list.push_str(&format!("file '{}'\n", quote(last)));
    }
    list
}

fn quote(name: &str) -> String {
    name.replace('\'', "'\\''")
}

fn image_prompt(idea_title: &str, section_text: &str, video_title: &str) -> String {
    format!(
        "Warm, bright, family-friendly illustration for the video \"{}\" ({}). Scene: {}. No text or lettering in the image.",
        idea_title, video_title, section_text
    )
}

fn media_error<E: Into<anyhow::Error>>(stage: MediaStage) -> impl Fn(E) -> StudioError {
    move |err| StudioError::Media {
        stage,
        reason: format!("{:#}", err.into()),
    }
}

pub struct MediaAssembler {
    speech: Box<dyn SpeechSynthesizer>,
    images: Box<dyn ImageSource>,
    encoder: Box<dyn VideoEncoder>,
}

impl MediaAssembler {
    pub fn new(
        speech: Box<dyn SpeechSynthesizer>,
        images: Box<dyn ImageSource>,
        encoder: Box<dyn VideoEncoder>,
    ) -> Self {
        Self {
            speech,
            images,
            encoder,
        }
    }

    /// Default backends. Needs an API key for the media endpoints.
    pub fn from_config(config: &MediaConfig) -> Result<Self> {
        let api_key = Provider::Openai
            .resolve_api_key(config.api_key.as_deref())
            .map_err(|e| StudioError::Request {
                stage: Stage::Media,
                source: ClientError::ProviderError(e),
            })?;
        let http = reqwest::Client::new();

        Ok(Self::new(
            Box::new(OpenAiSpeech::new(http.clone(), config, api_key.clone())),
            Box::new(OpenAiImages::new(http, config, api_key)),
            Box::new(FfmpegEncoder::new(config)),
        ))
    }

    /// Narrate the script, fetch one still per narrated section and encode
    /// both into `output`. `work_dir` is created here and always removed; a
    /// partially written `output` is removed on failure.
    pub async fn assemble(
        &self,
        script: &Script,
        metadata: &Metadata,
        work_dir: &Path,
        output: &Path,
    ) -> Result<VideoArtifact> {
        fs::create_dir_all(work_dir)
            .await
            .with_context(|| format!("creating work dir {}", work_dir.display()))
            .map_err(media_error(MediaStage::Speech))?;
        let result = self.assemble_in(script, metadata, work_dir, output).await;

        if let Err(err) = fs::remove_dir_all(work_dir).await {
            warn!(dir = %work_dir.display(), error = %err, "could not remove media work dir");
        }
        if result.is_err() && fs::try_exists(output).await.unwrap_or(false) {
            if let Err(err) = fs::remove_file(output).await {
                warn!(file = %output.display(), error = %err, "could not remove partial video");
            }
        }
        result
    }

    async fn assemble_in(
        &self,
        script: &Script,
        metadata: &Metadata,
        work_dir: &Path,
        output: &Path,
    ) -> Result<VideoArtifact> {
        let sections: Vec<_> = script.narrated_sections().collect();
        if sections.is_empty() {
            return Err(StudioError::Media {
                stage: MediaStage::Speech,
                reason: "script has no narration".to_string(),
            });
        }

        info!(sections = sections.len(), "synthesizing narration");
        let narration = script.narration();
        let wav = self
            .speech
            .synthesize(&narration)
            .await
            .map_err(media_error(MediaStage::Speech))?;
        let duration = wav_duration(&wav).map_err(media_error(MediaStage::Speech))?;
        let audio = work_dir.join("narration.wav");
        fs::write(&audio, &wav)
            .await
            .with_context(|| format!("writing {}", audio.display()))
            .map_err(media_error(MediaStage::Speech))?;
        debug!(seconds = duration, "narration ready");

        let counts: Vec<usize> = sections.iter().map(|(_, text)| word_count(text)).collect();
        let durations = segment_durations(&counts, duration);

        let mut entries = Vec::with_capacity(sections.len());
        for (index, ((section, text), seconds)) in sections.iter().zip(durations).enumerate() {
            info!(%section, "fetching image");
            let prompt = image_prompt(&script.idea.title, text, &metadata.title);
            let image = self
                .images
                .fetch(&prompt)
                .await
                .map_err(media_error(MediaStage::Images))?;
            let name = format!("{:02}-{}.png", index, section.key());
            let path = work_dir.join(&name);
            fs::write(&path, &image)
                .await
                .with_context(|| format!("writing {}", path.display()))
                .map_err(media_error(MediaStage::Images))?;
            entries.push((name, seconds));
        }

        let list_path = work_dir.join("images.ffconcat");
        fs::write(&list_path, concat_list(&entries))
            .await
            .with_context(|| format!("writing {}", list_path.display()))
            .map_err(media_error(MediaStage::Encode))?;

        info!(output = %output.display(), "encoding video");
        self.encoder
            .encode(&EncodeJob {
                concat_list: list_path,
                audio,
                output: output.to_path_buf(),
            })
            .await
            .map_err(media_error(MediaStage::Encode))?;

        Ok(VideoArtifact {
            file_path: output.to_path_buf(),
            duration_seconds: duration,
        })
    }
}
