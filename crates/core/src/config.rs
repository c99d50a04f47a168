use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{Result, StudioError},
    media::MediaConfig,
    provider::Provider,
    templates::QualityThresholds,
};

pub const LOCAL_CONFIG_FILE: &str = "gracy.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudioConfig {
    pub provider: Provider,
    /// Overrides the provider's environment variable
    pub api_key: Option<String>,
    pub output_dir: Option<PathBuf>,
    /// Extra script attempts after the first one fails the gate
    pub max_script_retries: u32,
    /// Abort instead of accepting the best attempt once retries run out
    pub strict_quality: bool,
    pub quality: QualityThresholds,
    pub media: MediaConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_key: None,
            output_dir: None,
            max_script_retries: 2,
            strict_quality: false,
            quality: QualityThresholds::default(),
            media: MediaConfig::default(),
        }
    }
}

/// Where to look for a config file when none is given, in priority order
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("gracy").join("config.toml"));
    }
    paths
}

impl StudioConfig {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self> {
        let config: StudioConfig = toml::from_str(text).map_err(|e| StudioError::Config {
            path: path.to_path_buf(),
            reason: e.message().trim().to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |reason: String| StudioError::Config {
            path: path.to_path_buf(),
            reason,
        };
        let mut bounds: Vec<(String, _)> = crate::types::Section::ALL
            .into_iter()
            .filter_map(|s| self.quality.sections.get(s).map(|b| (s.key().to_string(), b)))
            .collect();
        if let Some(total) = self.quality.total {
            bounds.push(("total".to_string(), total));
        }
        for (name, b) in bounds {
            if b.min_words > b.max_words {
                return Err(invalid(format!(
                    "quality bounds for {}: min_words {} exceeds max_words {}",
                    name, b.min_words, b.max_words
                )));
            }
        }
        if self.media.fps == 0 || self.media.width == 0 || self.media.height == 0 {
            return Err(invalid("media fps, width and height must be positive".to_string()));
        }
        Ok(())
    }

    pub async fn load_file(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StudioError::Config {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Self::from_toml_str(&text, path)
    }

    /// Load an explicit file, or the first existing default location, or
    /// fall back to built-in defaults. Returns the file actually used.
    pub async fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load_file(path).await?, Some(path.to_path_buf())));
        }
        Self::load_first(&default_config_paths()).await
    }

    pub async fn load_first(candidates: &[PathBuf]) -> Result<(Self, Option<PathBuf>)> {
        for path in candidates {
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                debug!(path = %path.display(), "loading config");
                return Ok((Self::load_file(path).await?, Some(path.clone())));
            }
        }
        debug!("no config file found, using defaults");
        Ok((Self::default(), None))
    }
}
