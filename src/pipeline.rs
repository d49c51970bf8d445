use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, TELEGRAM_CHAT_ID};
use crate::downloader::FfmpegDownloader;
use crate::error::PipelineError;
use crate::gofile_uploader::GofileUploader;
use crate::gradio::GradioClient;
use crate::telegram::TelegramNotifier;
use crate::utilities::media_path;

pub const DEFAULT_SEED: i64 = 3;
pub const DEFAULT_FPS: i64 = 10;
pub const MISSING_PROMPT: &str = "Missing prompt. This ain't it, chief.";

/// A validated generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub seed: i64,
    pub fps: i64,
}

impl GenerationRequest {
    pub fn new(
        prompt: Option<String>,
        seed: Option<i64>,
        fps: Option<i64>,
    ) -> Result<Self, PipelineError> {
        let prompt = prompt
            .filter(|p| !p.is_empty())
            .ok_or_else(|| PipelineError::Validation(MISSING_PROMPT.to_string()))?;

        Ok(GenerationRequest {
            prompt,
            seed: seed.unwrap_or(DEFAULT_SEED),
            fps: fps.unwrap_or(DEFAULT_FPS),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub streaming_url: String,
}

impl GenerationResult {
    /// Accepts only URLs with an HTTP(S) scheme.
    pub fn from_stream_url(url: Option<&str>) -> Result<Self, PipelineError> {
        match url {
            Some(url) if url.starts_with("http") => Ok(GenerationResult {
                streaming_url: url.to_string(),
            }),
            Some(url) => Err(PipelineError::InvalidStreamUrl(url.to_string())),
            None => Err(PipelineError::InvalidStreamUrl(
                "no video url in generation result".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadResult {
    pub public_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationResult {
    pub message_id: i64,
    pub permalink: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub upload: UploadResult,
    pub notification: NotificationResult,
}

#[async_trait]
pub trait VideoGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, PipelineError>;
}

#[async_trait]
pub trait MediaDownloader: Send + Sync {
    async fn download(&self, stream_url: &str, dest: &Path) -> Result<(), PipelineError>;
}

#[async_trait]
pub trait FileHost: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<UploadResult, PipelineError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, path: &Path, prompt: &str) -> Result<NotificationResult, PipelineError>;
}

/// The local video file of one request. Removed when dropped, whichever way
/// the request ends; a file that was never written is not an error.
pub struct TempMedia {
    path: PathBuf,
}

impl TempMedia {
    pub fn new(path: PathBuf) -> Self {
        TempMedia { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempMedia {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed {}", self.path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!("Cleanup of {} failed: {}", self.path.display(), err),
        }
    }
}

/// Generate, download, upload, notify. Stops at the first failing stage.
pub struct Pipeline {
    generator: Arc<dyn VideoGenerator>,
    downloader: Arc<dyn MediaDownloader>,
    uploader: Arc<dyn FileHost>,
    notifier: Arc<dyn Notifier>,
    media_dir: PathBuf,
}

impl Pipeline {
    pub fn new(
        generator: Arc<dyn VideoGenerator>,
        downloader: Arc<dyn MediaDownloader>,
        uploader: Arc<dyn FileHost>,
        notifier: Arc<dyn Notifier>,
        media_dir: PathBuf,
    ) -> Self {
        Pipeline {
            generator,
            downloader,
            uploader,
            notifier,
            media_dir,
        }
    }

    /// Wires the real Gradio, ffmpeg, Gofile and Telegram collaborators.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        std::fs::create_dir_all(&config.media_dir).with_context(|| {
            format!("Failed to create media dir {}", config.media_dir.display())
        })?;

        let mut generator = GradioClient::new(
            http.clone(),
            &config.gradio_space,
            &config.gradio_endpoint,
        );
        if let Some(host) = &config.gradio_host {
            generator = generator.with_host(host);
        }

        Ok(Pipeline::new(
            Arc::new(generator),
            Arc::new(FfmpegDownloader::new(&config.ffmpeg_bin)),
            Arc::new(GofileUploader::new(http.clone(), &config.gofile_upload_url)),
            Arc::new(TelegramNotifier::new(
                http,
                &config.telegram_api_base,
                &config.telegram_bot_token,
                TELEGRAM_CHAT_ID,
            )),
            config.media_dir.clone(),
        ))
    }

    pub async fn run(&self, request: &GenerationRequest) -> Result<PipelineOutcome, PipelineError> {
        let generated = self.generator.generate(request).await?;
        info!("Generated stream at {}", generated.streaming_url);

        let media = TempMedia::new(media_path(&self.media_dir));
        self.downloader
            .download(&generated.streaming_url, media.path())
            .await?;
        info!("Downloaded video to {}", media.path().display());

        let upload = self.uploader.upload(media.path()).await?;
        info!("Uploaded video to {}", upload.public_url);

        let notification = self.notifier.notify(media.path(), &request.prompt).await?;
        info!("Posted message {}", notification.message_id);

        Ok(PipelineOutcome {
            upload,
            notification,
        })
    }
}
