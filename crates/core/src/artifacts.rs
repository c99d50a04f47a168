use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;

/// Unique, sortable name for one invocation: `20261016-093000-1a2b3c4d`
pub fn new_run_id() -> String {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", stamp, &suffix[..8])
}

/// Fallback output root when neither config nor CLI names one
pub fn default_output_root() -> PathBuf {
    dirs::video_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gracy")
}

/// Create a fresh run directory under `root`
pub async fn create_run_dir(root: &Path) -> Result<PathBuf> {
    let dir = root.join(new_run_id());
    fs::create_dir_all(&dir).await?;
    debug!(dir = %dir.display(), "created run directory");
    Ok(dir)
}

pub fn get_idea_path(run_dir: &Path) -> PathBuf {
    run_dir.join("idea.json")
}

pub fn get_script_path(run_dir: &Path) -> PathBuf {
    run_dir.join("script.json")
}

/// Human-readable copy of the script next to the JSON
pub fn get_script_markdown_path(run_dir: &Path) -> PathBuf {
    run_dir.join("script.md")
}

pub fn get_metadata_path(run_dir: &Path) -> PathBuf {
    run_dir.join("metadata.json")
}

pub fn get_video_path(run_dir: &Path) -> PathBuf {
    run_dir.join("video.mp4")
}

/// Run summary written at the end of every run
pub fn get_report_path(run_dir: &Path) -> PathBuf {
    run_dir.join("report.json")
}

/// Scratch space for media assembly; removed once the video is encoded
pub fn get_work_dir(run_dir: &Path) -> PathBuf {
    run_dir.join(".work")
}

pub async fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let pretty_json = serde_json::to_string_pretty(value)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}

pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json_content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json_content)?)
}

pub async fn save_text(text: &str, path: &Path) -> Result<()> {
    fs::write(path, text).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_unique() {
        let a = new_run_id();
        let b = new_run_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), "20261016-093000-1a2b3c4d".len());
    }

    #[tokio::test]
    async fn json_round_trips_through_run_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = create_run_dir(root.path()).await.unwrap();
        let path = get_idea_path(&dir);
        save_json(&serde_json::json!({"title": "First Snow"}), &path)
            .await
            .unwrap();
        let value: serde_json::Value = load_json(&path).await.unwrap();
        assert_eq!(value["title"], "First Snow");
        assert!(dir.starts_with(root.path()));
    }
}
