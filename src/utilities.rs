use anyhow::{Context, Result};
use chrono::Utc;
use log::debug;
use reqwest::multipart::Part;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

/// Builds a file name unique to one request: `gen_<millis>_<uuid>.mp4`.
pub fn media_file_name() -> String {
    format!(
        "gen_{}_{}.mp4",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

pub fn media_path(dir: &Path) -> PathBuf {
    dir.join(media_file_name())
}

/// Runs ffmpeg with the given arguments and returns its captured output.
pub async fn run_ffmpeg(bin: &str, args: &[&str]) -> std::io::Result<Output> {
    let output = tokio::process::Command::new(bin)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await?;

    debug!("ffmpeg stdout: {}", String::from_utf8_lossy(&output.stdout));
    debug!("ffmpeg stderr: {}", String::from_utf8_lossy(&output.stderr));

    Ok(output)
}

/// Wraps a local video as a multipart part that is streamed from disk
/// rather than read into memory.
pub async fn file_part(path: &Path) -> Result<Part> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("could not open {}", path.display()))?;
    let len = file.metadata().await?.len();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video.mp4".to_string());

    let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
    let part = Part::stream_with_length(body, len)
        .file_name(file_name)
        .mime_str("video/mp4")?;
    Ok(part)
}
