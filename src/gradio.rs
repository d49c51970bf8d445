//! Client for a Gradio app's HTTP API.
//!
//! A call is two requests: `POST /gradio_api/call/<endpoint>` queues the job
//! and returns an event id, then `GET /gradio_api/call/<endpoint>/<event_id>`
//! streams server-sent events until the job completes or errors.

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::PipelineError;
use crate::pipeline::{GenerationRequest, GenerationResult, VideoGenerator};

const HF_SPACES_API: &str = "https://huggingface.co/api/spaces";

pub struct GradioClient {
    http: reqwest::Client,
    space: String,
    endpoint: String,
    host: Option<String>,
    hub_api: String,
}

#[derive(Deserialize)]
struct SpaceHost {
    host: String,
}

#[derive(Deserialize)]
struct QueuedCall {
    event_id: String,
}

impl GradioClient {
    /// * `space` - Hugging Face space id, e.g. "multimodalart/self-forcing".
    /// * `endpoint` - API name, e.g. "/video_generation_handler_streaming".
    pub fn new(http: reqwest::Client, space: &str, endpoint: &str) -> Self {
        GradioClient {
            http,
            space: space.to_string(),
            endpoint: endpoint.trim_start_matches('/').to_string(),
            host: None,
            hub_api: HF_SPACES_API.to_string(),
        }
    }

    /// Talk to this host directly instead of asking the hub where the space runs.
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.trim_end_matches('/').to_string());
        self
    }

    #[cfg(test)]
    pub fn with_hub_api(mut self, hub_api: &str) -> Self {
        self.hub_api = hub_api.trim_end_matches('/').to_string();
        self
    }

    async fn resolve_host(&self) -> Result<String, PipelineError> {
        if let Some(host) = &self.host {
            return Ok(host.clone());
        }

        let connection = |reason: String| PipelineError::Connection(format!("{}: {}", self.space, reason));
        let resp = self
            .http
            .get(format!("{}/{}/host", self.hub_api, self.space))
            .send()
            .await
            .map_err(|err| connection(err.to_string()))?;
        if !resp.status().is_success() {
            return Err(connection(format!("space lookup returned {}", resp.status())));
        }
        let space: SpaceHost = resp.json().await.map_err(|err| connection(err.to_string()))?;
        Ok(space.host.trim_end_matches('/').to_string())
    }

    /// Resolves the space and checks that its app answers.
    pub async fn connect(&self) -> Result<String, PipelineError> {
        let host = self.resolve_host().await?;
        let resp = self
            .http
            .get(format!("{}/config", host))
            .send()
            .await
            .map_err(|err| PipelineError::Connection(format!("{}: {}", host, err)))?;
        if !resp.status().is_success() {
            return Err(PipelineError::Connection(format!(
                "{} answered {}",
                host,
                resp.status()
            )));
        }
        debug!("Connected to {} at {}", self.space, host);
        Ok(host)
    }

    /// Queues a call on `host` and waits for its final output.
    pub async fn predict(&self, host: &str, data: Value) -> Result<Value, PipelineError> {
        let call_url = format!("{}/gradio_api/call/{}", host, self.endpoint);
        let prediction = |reason: String| PipelineError::Prediction(format!("/{}: {}", self.endpoint, reason));

        let resp = self
            .http
            .post(&call_url)
            .json(&json!({ "data": data }))
            .send()
            .await
            .map_err(|err| prediction(err.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(prediction(format!("{} {}", status, body)));
        }
        let queued: QueuedCall = resp.json().await.map_err(|err| prediction(err.to_string()))?;
        debug!("Queued /{} as {}", self.endpoint, queued.event_id);

        let events = self
            .http
            .get(format!("{}/{}", call_url, queued.event_id))
            .send()
            .await
            .map_err(|err| prediction(err.to_string()))?
            .text()
            .await
            .map_err(|err| prediction(err.to_string()))?;

        read_event_stream(&events).map_err(prediction)
    }
}

/// Returns the last non-null payload of a stream that reached `complete`.
fn read_event_stream(body: &str) -> Result<Value, String> {
    let mut event = "";
    let mut last = None;
    let mut completed = false;

    for line in body.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim();
            continue;
        }
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        match event {
            "error" => {
                return Err(match data {
                    "" | "null" => "remote endpoint reported an error".to_string(),
                    other => other.to_string(),
                })
            }
            "generating" | "complete" => {
                if let Ok(value) = serde_json::from_str::<Value>(data) {
                    if !value.is_null() {
                        last = Some(value);
                    }
                }
                completed |= event == "complete";
            }
            // heartbeat
            _ => {}
        }
    }

    match last {
        Some(value) if completed => Ok(value),
        _ => Err("event stream ended without a result".to_string()),
    }
}

/// `data[0].video.url` of a video output.
fn video_url(output: &Value) -> Option<&str> {
    output
        .get(0)
        .and_then(|first| first.get("video"))
        .and_then(|video| video.get("url"))
        .and_then(Value::as_str)
}

#[async_trait]
impl VideoGenerator for GradioClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, PipelineError> {
        let host = self.connect().await?;
        let output = self
            .predict(&host, json!([request.prompt, request.seed, request.fps]))
            .await?;
        GenerationResult::from_stream_url(video_url(&output))
    }
}
