//! Environment configuration.

use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Captioning sidecar endpoint
    pub caption_endpoint: String,
    /// Audio classification sidecar endpoint
    pub audio_tag_endpoint: String,
    /// Length of the audio window extracted around each sampled frame
    pub audio_window_secs: f64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            addr: env::var("ADDR").unwrap_or_else(|_| String::from("127.0.0.1")),
            port: env::var("PORT").unwrap_or_else(|_| String::from("3000")),
            caption_endpoint: env::var("CAPTION_ENDPOINT")
                .unwrap_or_else(|_| String::from("http://127.0.0.1:8601/caption")),
            audio_tag_endpoint: env::var("AUDIO_TAG_ENDPOINT")
                .unwrap_or_else(|_| String::from("http://127.0.0.1:8602/classify")),
            audio_window_secs: env::var("AUDIO_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1.0),
        }
    }
}
