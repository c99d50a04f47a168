use anyhow::Context;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::debug;

use super::{ImageSource, MediaConfig};

/// `POST {base_url}/images/generations` with a base64 payload
pub struct OpenAiImages {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    size: String,
}

impl OpenAiImages {
    pub fn new(http: reqwest::Client, config: &MediaConfig, api_key: String) -> Self {
        Self {
            http,
            url: format!("{}/images/generations", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.image_model.clone(),
            size: config.image_size.clone(),
        }
    }
}

fn decode_image(response: &serde_json::Value) -> anyhow::Result<Vec<u8>> {
    let encoded = response["data"][0]["b64_json"]
        .as_str()
        .context("image response has no data[0].b64_json")?;
    let bytes = STANDARD
        .decode(encoded.trim())
        .context("image payload is not valid base64")?;
    anyhow::ensure!(!bytes.is_empty(), "image payload is empty");
    Ok(bytes)
}

#[async_trait]
impl ImageSource for OpenAiImages {
    async fn fetch(&self, prompt: &str) -> anyhow::Result<Vec<u8>> {
        debug!(model = %self.model, size = %self.size, "image request");

        let response = self
            .http
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": &self.model,
                "prompt": prompt,
                "n": 1,
                "size": &self.size,
                "response_format": "b64_json",
            }))
            .send()
            .await
            .context("image request failed")?
            .error_for_status()
            .context("image service rejected the request")?
            .json::<serde_json::Value>()
            .await
            .context("image response is not JSON")?;

        decode_image(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_first_image() {
        let response = serde_json::json!({ "data": [{ "b64_json": STANDARD.encode(b"png") }] });
        assert_eq!(decode_image(&response).unwrap(), b"png");
    }

    #[test]
    fn url_only_response_is_an_error() {
        let response = serde_json::json!({ "data": [{ "url": "https://example.com/a.png" }] });
        assert!(decode_image(&response).is_err());
    }
}
