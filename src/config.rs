use anyhow::{ensure, Context, Result};
use std::path::PathBuf;

/// Channel every generated video is posted to.
pub const TELEGRAM_CHAT_ID: &str = "@codewithprakhar";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_GRADIO_SPACE: &str = "multimodalart/self-forcing";
pub const DEFAULT_GRADIO_ENDPOINT: &str = "/video_generation_handler_streaming";
pub const DEFAULT_GOFILE_UPLOAD_URL: &str = "https://store1.gofile.io/uploadFile";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Process-wide settings, built once at startup and handed to the server.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub host: String,
    pub port: u16,
    pub ffmpeg_bin: String,
    pub media_dir: PathBuf,
    pub gofile_upload_url: String,
    pub telegram_api_base: String,
    pub gradio_space: String,
    pub gradio_endpoint: String,
    /// Skips Hugging Face host resolution when set (e.g. a self-hosted space).
    pub gradio_host: Option<String>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Fails when the bot token
    /// is missing or the port is not a number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        ensure!(
            !telegram_bot_token.is_empty(),
            "TELEGRAM_BOT_TOKEN is missing. Go check your .env."
        );

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a valid port number, got {:?}", raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            telegram_bot_token,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            ffmpeg_bin: get("FFMPEG_BIN").unwrap_or_else(|| "ffmpeg".to_string()),
            media_dir: get("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            gofile_upload_url: get("GOFILE_UPLOAD_URL")
                .unwrap_or_else(|| DEFAULT_GOFILE_UPLOAD_URL.to_string()),
            telegram_api_base: get("TELEGRAM_API_BASE")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string()),
            gradio_space: get("GRADIO_SPACE").unwrap_or_else(|| DEFAULT_GRADIO_SPACE.to_string()),
            gradio_endpoint: get("GRADIO_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_GRADIO_ENDPOINT.to_string()),
            gradio_host: get("GRADIO_HOST"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_token_fails_fast() {
        let err = Config::from_lookup(lookup(&[("PORT", "8080")])).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        assert!(Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "  ")])).is_err());
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.ffmpeg_bin, "ffmpeg");
        assert_eq!(config.gofile_upload_url, DEFAULT_GOFILE_UPLOAD_URL);
        assert_eq!(config.gradio_space, "multimodalart/self-forcing");
        assert!(config.gradio_host.is_none());
    }

    #[test]
    fn port_is_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("PORT", "8081"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8081);
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
