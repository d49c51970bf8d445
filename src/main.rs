mod api;
mod config;
mod downloader;
mod error;
mod gofile_uploader;
mod gradio;
mod pipeline;
mod telegram;
mod utilities;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use log::error;

use crate::config::Config;
use crate::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine, the variables may come from the environment.
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{:#}", err);
            return Err(err);
        }
    };
    let pipeline = Pipeline::from_config(&config)?;

    api::run_api_server(&config, pipeline).await?;
    Ok(())
}
