use async_trait::async_trait;
use log::debug;
use std::path::Path;

use crate::error::PipelineError;
use crate::pipeline::MediaDownloader;
use crate::utilities::run_ffmpeg;

/// Remuxes a streaming URL (HLS manifest) into a local mp4 with ffmpeg.
pub struct FfmpegDownloader {
    bin: String,
}

impl FfmpegDownloader {
    pub fn new(bin: &str) -> Self {
        FfmpegDownloader {
            bin: bin.to_string(),
        }
    }
}

#[async_trait]
impl MediaDownloader for FfmpegDownloader {
    async fn download(&self, stream_url: &str, dest: &Path) -> Result<(), PipelineError> {
        let dest = dest.to_string_lossy().into_owned();
        debug!("Remuxing {} into {}", stream_url, dest);

        let output = run_ffmpeg(
            &self.bin,
            &[
                "-y", // Overwrite output if it exists
                "-i",
                stream_url,
                "-c",
                "copy", // Copy codec, no re-encode
                dest.as_str(),
            ],
        )
        .await
        .map_err(|err| PipelineError::Download(format!("could not run {}: {}", self.bin, err)))?;

        if !output.status.success() {
            return Err(PipelineError::Download(format!(
                "FFmpeg error: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}
