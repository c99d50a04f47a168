use std::{ffi::OsString, path::PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{EncodeJob, MediaConfig, VideoEncoder};

/// Stills + narration to H.264/AAC MP4 through the `ffmpeg` binary
pub struct FfmpegEncoder {
    program: PathBuf,
    fps: u32,
    width: u32,
    height: u32,
}

impl FfmpegEncoder {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            program: config.ffmpeg.clone(),
            fps: config.fps,
            width: config.width,
            height: config.height,
        }
    }

    fn args(&self, job: &EncodeJob) -> Vec<OsString> {
        let (w, h) = (self.width, self.height);
        let filter = format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,format=yuv420p"
        );
        let mut args: Vec<OsString> = ["-y", "-f", "concat", "-safe", "0", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(job.concat_list.clone().into());
        args.push("-i".into());
        args.push(job.audio.clone().into());
        args.extend(
            [
                "-vf".to_string(),
                filter,
                "-r".to_string(),
                self.fps.to_string(),
                "-c:v".to_string(),
                "libx264".to_string(),
                "-c:a".to_string(),
                "aac".to_string(),
                "-shortest".to_string(),
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(job.output.clone().into());
        args
    }
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn encode(&self, job: &EncodeJob) -> anyhow::Result<()> {
        let args = self.args(job);
        debug!(program = %self.program.display(), ?args, "running ffmpeg");

        let output = Command::new(&self.program).args(&args).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            anyhow::bail!(
                "ffmpeg exited with {}: {}",
                output.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_pad_to_frame_and_stop_with_audio() {
        let encoder = FfmpegEncoder::new(&MediaConfig::default());
        let job = EncodeJob {
            concat_list: PathBuf::from("/w/images.ffconcat"),
            audio: PathBuf::from("/w/narration.wav"),
            output: PathBuf::from("/run/video.mp4"),
        };
        let args: Vec<String> = encoder
            .args(&job)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(&args[..7], ["-y", "-f", "concat", "-safe", "0", "-i", "/w/images.ffconcat"]);
        assert!(args.iter().any(|a| a.contains("pad=1280:720:(ow-iw)/2:(oh-ih)/2")));
        assert!(args.contains(&"-shortest".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/run/video.mp4"));
    }

    #[tokio::test]
    async fn missing_binary_is_an_error() {
        let encoder = FfmpegEncoder::new(&MediaConfig {
            ffmpeg: PathBuf::from("/nonexistent/ffmpeg-for-tests"),
            ..MediaConfig::default()
        });
        let job = EncodeJob {
            concat_list: PathBuf::from("list"),
            audio: PathBuf::from("a.wav"),
            output: PathBuf::from("out.mp4"),
        };
        assert!(encoder.encode(&job).await.is_err());
    }
}
