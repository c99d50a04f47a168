use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use super::{MediaConfig, SpeechSynthesizer};

/// `POST {base_url}/audio/speech`, WAV response
pub struct OpenAiSpeech {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    voice: String,
}

impl OpenAiSpeech {
    pub fn new(http: reqwest::Client, config: &MediaConfig, api_key: String) -> Self {
        Self {
            http,
            url: format!("{}/audio/speech", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.tts_model.clone(),
            voice: config.voice.clone(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str) -> anyhow::Result<Vec<u8>> {
        debug!(model = %self.model, voice = %self.voice, chars = text.len(), "tts request");

        let bytes = self
            .http
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": &self.model,
                "voice": &self.voice,
                "input": text,
                "response_format": "wav",
            }))
            .send()
            .await
            .context("TTS request failed")?
            .error_for_status()
            .context("TTS service rejected the request")?
            .bytes()
            .await
            .context("could not read TTS audio")?;

        anyhow::ensure!(!bytes.is_empty(), "TTS service returned no audio");
        Ok(bytes.to_vec())
    }
}
