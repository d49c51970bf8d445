use actix_web::{get, middleware::Logger, web, App, HttpResponse, HttpServer};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::PipelineError;
use crate::pipeline::{GenerationRequest, Pipeline};

pub const SENT_MESSAGE: &str = "Sent to group successfully.";

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    pub prompt: Option<String>,
    pub seed: Option<i64>,
    pub fps: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub url: String,
    pub message: String,
    pub link: String,
}

/// Generate a video from a prompt, upload it and post it to the channel.
///
/// # Example
/// ```shell
/// curl "http://localhost:3000/generate-video?prompt=a%20cat&seed=3&fps=10"
/// ```
///
/// # Returns
/// ```json
/// {
///    "url": "https://gofile.io/d/abc123",
///    "message": "Sent to group successfully.",
///    "link": "https://t.me/codewithprakhar/42"
/// }
/// ```
#[get("/generate-video")]
pub async fn generate_video(
    pipeline: web::Data<Pipeline>,
    query: web::Query<GenerateQuery>,
) -> Result<HttpResponse, PipelineError> {
    let query = query.into_inner();
    let request = GenerationRequest::new(query.prompt, query.seed, query.fps)?;
    info!(
        "Generating video for {:?} (seed {}, fps {})",
        request.prompt, request.seed, request.fps
    );

    match pipeline.run(&request).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(GenerateResponse {
            url: outcome.upload.public_url,
            message: SENT_MESSAGE.to_string(),
            link: outcome.notification.permalink,
        })),
        Err(err) => {
            error!("{} stage failed: {}", err.stage(), err);
            Err(err)
        }
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(generate_video);
}

/// Run the API server
pub async fn run_api_server(config: &Config, pipeline: Pipeline) -> std::io::Result<()> {
    let pipeline = web::Data::new(pipeline);
    info!("API running on http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(pipeline.clone())
            .configure(routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
