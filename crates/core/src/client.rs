use async_trait::async_trait;
use tracing::debug;

use crate::provider::{Provider, ProviderError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Provider error: {0}")]
    ProviderError(#[from] ProviderError),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("AI service returned an empty response")]
    Empty,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// A generative-text service: one prompt in, unstructured text out
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ClientError>;
}

/// Chat-completions client for OpenAI-compatible endpoints
pub struct ChatClient {
    http: reqwest::Client,
    provider: Provider,
    api_key: String,
}

impl ChatClient {
    pub fn new(provider: Provider, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            provider,
            api_key,
        }
    }

    pub fn from_env(provider: Provider, configured_key: Option<&str>) -> Result<Self, ClientError> {
        let api_key = provider.resolve_api_key(configured_key)?;
        Ok(Self::new(provider, api_key))
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ClientError> {
        let config = self.provider.config();
        debug!(provider = self.provider.name(), model = config.model, "chat completion");

        let response = self
            .http
            .post(config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": config.model,
                "messages": [
                    {
                        "role": "system",
                        "content": &request.system,
                    },
                    {
                        "role": "user",
                        "content": &request.user,
                    },
                ],
                "temperature": request.temperature,
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ClientError::InvalidResponse(format!("{:?}", response)))?;

        if content.trim().is_empty() {
            return Err(ClientError::Empty);
        }
        Ok(content.to_string())
    }
}

/// Pull the outermost JSON object out of a model reply, ignoring code fences
/// and any prose around it.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
