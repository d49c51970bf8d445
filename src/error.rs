use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Failure of one pipeline stage. The variant names the stage, the message
/// is what the caller sees.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),

    #[error("Could not connect to generation service: {0}")]
    Connection(String),

    #[error("Generation failed: {0}")]
    Prediction(String),

    #[error("Invalid M3U8 URL: {0}")]
    InvalidStreamUrl(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Gofile upload error: {0}")]
    Upload(String),

    #[error("Telegram notify error: {0}")]
    Notify(String),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validate",
            PipelineError::Connection(_)
            | PipelineError::Prediction(_)
            | PipelineError::InvalidStreamUrl(_) => "generate",
            PipelineError::Download(_) => "download",
            PipelineError::Upload(_) => "upload",
            PipelineError::Notify(_) => "notify",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for PipelineError {
    fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            PipelineError::Validation(msg) => HttpResponse::BadRequest()
                .content_type("text/plain; charset=utf-8")
                .body(msg.clone()),
            other => HttpResponse::build(other.status_code()).json(ErrorBody {
                error: other.to_string(),
            }),
        }
    }
}
