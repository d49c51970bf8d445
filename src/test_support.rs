//! In-process collaborators for pipeline and handler tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::PipelineError;
use crate::pipeline::{
    FileHost, GenerationRequest, GenerationResult, MediaDownloader, NotificationResult, Notifier,
    Pipeline, UploadResult, VideoGenerator,
};
use crate::telegram::permalink;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailAt {
    Nothing,
    Connect,
    Predict,
    InvalidUrl,
    Download,
    Upload,
    Notify,
}

#[derive(Default)]
pub struct CallLog {
    generate: AtomicUsize,
    download: AtomicUsize,
    upload: AtomicUsize,
    notify: AtomicUsize,
    files: Mutex<Vec<PathBuf>>,
    uploaded: Mutex<Vec<PathBuf>>,
    captions: Mutex<Vec<String>>,
}

impl CallLog {
    /// Calls made to generate, download, upload and notify, in that order.
    pub fn counts(&self) -> [usize; 4] {
        [
            self.generate.load(Ordering::SeqCst),
            self.download.load(Ordering::SeqCst),
            self.upload.load(Ordering::SeqCst),
            self.notify.load(Ordering::SeqCst),
        ]
    }

    /// Destination paths handed to the downloader.
    pub fn files(&self) -> Vec<PathBuf> {
        self.files.lock().unwrap().clone()
    }

    pub fn uploaded(&self) -> Vec<PathBuf> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn captions(&self) -> Vec<String> {
        self.captions.lock().unwrap().clone()
    }
}

/// Plays every collaborator at once and fails at the chosen stage.
pub struct FakeServices {
    fail_at: FailAt,
    pub log: Arc<CallLog>,
}

impl FakeServices {
    pub fn new(fail_at: FailAt) -> Arc<Self> {
        Arc::new(FakeServices {
            fail_at,
            log: Arc::new(CallLog::default()),
        })
    }
}

pub trait FakePipeline {
    fn pipeline(&self, media_dir: &Path) -> Pipeline;
}

impl FakePipeline for Arc<FakeServices> {
    fn pipeline(&self, media_dir: &Path) -> Pipeline {
        Pipeline::new(
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            media_dir.to_path_buf(),
        )
    }
}

#[async_trait]
impl VideoGenerator for FakeServices {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GenerationResult, PipelineError> {
        self.log.generate.fetch_add(1, Ordering::SeqCst);
        match self.fail_at {
            FailAt::Connect => Err(PipelineError::Connection("space unreachable".into())),
            FailAt::Predict => Err(PipelineError::Prediction("queue is full".into())),
            FailAt::InvalidUrl => GenerationResult::from_stream_url(Some("blob:stream/abc")),
            _ => GenerationResult::from_stream_url(Some("https://example.hf.space/stream.m3u8")),
        }
    }
}

#[async_trait]
impl MediaDownloader for FakeServices {
    async fn download(&self, _stream_url: &str, dest: &Path) -> Result<(), PipelineError> {
        self.log.download.fetch_add(1, Ordering::SeqCst);
        self.log.files.lock().unwrap().push(dest.to_path_buf());
        // a failed remux can still leave a partial file behind
        std::fs::write(dest, b"not really an mp4").unwrap();
        if self.fail_at == FailAt::Download {
            return Err(PipelineError::Download("FFmpeg error: exit status: 1".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl FileHost for FakeServices {
    async fn upload(&self, path: &Path) -> Result<UploadResult, PipelineError> {
        self.log.upload.fetch_add(1, Ordering::SeqCst);
        self.log.uploaded.lock().unwrap().push(path.to_path_buf());
        assert!(path.exists(), "uploading a file that does not exist");
        if self.fail_at == FailAt::Upload {
            return Err(PipelineError::Upload("Gofile API failed: {\"status\":\"error\"}".into()));
        }
        Ok(UploadResult {
            public_url: "https://gofile.io/d/abc123".into(),
        })
    }
}

#[async_trait]
impl Notifier for FakeServices {
    async fn notify(&self, path: &Path, prompt: &str) -> Result<NotificationResult, PipelineError> {
        self.log.notify.fetch_add(1, Ordering::SeqCst);
        self.log.captions.lock().unwrap().push(prompt.to_string());
        assert!(path.exists(), "notifying with a file that does not exist");
        if self.fail_at == FailAt::Notify {
            return Err(PipelineError::Notify("Telegram failed: {\"ok\":false}".into()));
        }
        Ok(NotificationResult {
            message_id: 42,
            permalink: permalink("@codewithprakhar", 42),
        })
    }
}
