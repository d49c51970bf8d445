use async_trait::async_trait;
use log::debug;
use reqwest::multipart::Form;
use serde_json::Value;
use std::path::Path;

use crate::error::PipelineError;
use crate::pipeline::{FileHost, UploadResult};
use crate::utilities::file_part;

pub struct GofileUploader {
    http: reqwest::Client,
    upload_url: String,
}

impl GofileUploader {
    /// * `upload_url` - The Gofile upload endpoint, e.g.
    ///   "https://store1.gofile.io/uploadFile".
    pub fn new(http: reqwest::Client, upload_url: &str) -> Self {
        GofileUploader {
            http,
            upload_url: upload_url.to_string(),
        }
    }
}

/// Pulls the download page out of a Gofile response body.
fn download_page(body: &Value) -> Result<String, PipelineError> {
    let ok = body.get("status").and_then(Value::as_str) == Some("ok");
    match body.pointer("/data/downloadPage").and_then(Value::as_str) {
        Some(page) if ok => Ok(page.to_string()),
        _ => Err(PipelineError::Upload(format!("Gofile API failed: {}", body))),
    }
}

#[async_trait]
impl FileHost for GofileUploader {
    /// Uploads the file at `path` and returns its public download page.
    async fn upload(&self, path: &Path) -> Result<UploadResult, PipelineError> {
        let part = file_part(path)
            .await
            .map_err(|err| PipelineError::Upload(format!("{:#}", err)))?;
        let form = Form::new().part("file", part);

        debug!("Uploading {} to {}", path.display(), self.upload_url);
        let body: Value = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| PipelineError::Upload(err.to_string()))?
            .json()
            .await
            .map_err(|err| PipelineError::Upload(err.to_string()))?;

        Ok(UploadResult {
            public_url: download_page(&body)?,
        })
    }
}
