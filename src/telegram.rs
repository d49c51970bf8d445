use async_trait::async_trait;
use log::debug;
use reqwest::multipart::Form;
use serde_json::Value;
use std::path::Path;

use crate::error::PipelineError;
use crate::pipeline::{NotificationResult, Notifier};
use crate::utilities::file_part;

/// Posts videos to a fixed chat through the Bot API `sendVideo` method.
pub struct TelegramNotifier {
    http: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(http: reqwest::Client, api_base: &str, token: &str, chat_id: &str) -> Self {
        TelegramNotifier {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        }
    }
}

/// Public link to a message in a channel, e.g. `https://t.me/codewithprakhar/42`.
pub fn permalink(chat_id: &str, message_id: i64) -> String {
    format!(
        "https://t.me/{}/{}",
        chat_id.strip_prefix('@').unwrap_or(chat_id),
        message_id
    )
}

fn parse_send_response(chat_id: &str, body: &str) -> Result<NotificationResult, PipelineError> {
    let json: Value = serde_json::from_str(body)
        .map_err(|_| PipelineError::Notify("Invalid response from Telegram".to_string()))?;

    let ok = json.get("ok").and_then(Value::as_bool).unwrap_or(false);
    match json.pointer("/result/message_id").and_then(Value::as_i64) {
        Some(message_id) if ok => Ok(NotificationResult {
            message_id,
            permalink: permalink(chat_id, message_id),
        }),
        _ => Err(PipelineError::Notify(format!("Telegram failed: {}", body))),
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, path: &Path, prompt: &str) -> Result<NotificationResult, PipelineError> {
        let video = file_part(path)
            .await
            .map_err(|err| PipelineError::Notify(format!("{:#}", err)))?;
        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", format!("🎥 Prompt: {}", prompt))
            .part("video", video);

        debug!("Sending {} to {}", path.display(), self.chat_id);
        // the token is part of the URL, keep it out of error messages
        let body = self
            .http
            .post(format!("{}/bot{}/sendVideo", self.api_base, self.token))
            .multipart(form)
            .send()
            .await
            .map_err(|err| PipelineError::Notify(err.without_url().to_string()))?
            .text()
            .await
            .map_err(|err| PipelineError::Notify(err.without_url().to_string()))?;

        parse_send_response(&self.chat_id, &body)
    }
}
