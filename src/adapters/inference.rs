//! HTTP adapters for the captioning and audio classification sidecars.
//!
//! The models themselves live in separate inference services; these adapters
//! are constructed once at startup and shared read-only across requests.

use crate::domain::merge::AudioTag;
use crate::ports::taggers::{AudioTagger, FrameTagger, TagError};
use async_trait::async_trait;
use image::RgbImage;
use serde::Deserialize;
use std::io::Cursor;
use std::path::Path;

/// Captioning sidecar client. Frames are PNG-encoded and posted one at a
/// time; the response order therefore matches the input order.
pub struct HttpFrameTagger {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpFrameTagger {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Deserialize)]
struct CaptionResponse {
    caption: String,
}

#[async_trait]
impl FrameTagger for HttpFrameTagger {
    async fn caption_frames(&self, frames: &[RgbImage]) -> Result<Vec<String>, TagError> {
        let mut captions = Vec::with_capacity(frames.len());

        for frame in frames {
            let mut png = Vec::new();
            frame
                .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
                .map_err(|e| TagError(format!("failed to encode frame: {}", e)))?;

            let part = reqwest::multipart::Part::bytes(png)
                .file_name("frame.png")
                .mime_str("image/png")
                .map_err(|e| TagError(format!("failed to build frame part: {}", e)))?;
            let form = reqwest::multipart::Form::new().part("image", part);

            let response = self
                .client
                .post(&self.endpoint)
                .multipart(form)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| TagError(format!("caption request failed: {}", e)))?;

            let body: CaptionResponse = response
                .json()
                .await
                .map_err(|e| TagError(format!("bad caption response: {}", e)))?;
            captions.push(body.caption);
        }

        Ok(captions)
    }
}

/// Audio classifier sidecar client. Posts the extracted WAV clip and expects
/// ranked `{label, score}` tags back.
pub struct HttpAudioTagger {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAudioTagger {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Deserialize)]
struct TagResponse {
    tags: Vec<AudioTag>,
}

#[async_trait]
impl AudioTagger for HttpAudioTagger {
    async fn tag_clip(&self, clip: &Path) -> Result<Vec<AudioTag>, TagError> {
        let wav = tokio::fs::read(clip)
            .await
            .map_err(|e| TagError(format!("failed to read clip {:?}: {}", clip, e)))?;

        let part = reqwest::multipart::Part::bytes(wav)
            .file_name("clip.wav")
            .mime_str("audio/wav")
            .map_err(|e| TagError(format!("failed to build clip part: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TagError(format!("audio tag request failed: {}", e)))?;

        let body: TagResponse = response
            .json()
            .await
            .map_err(|e| TagError(format!("bad audio tag response: {}", e)))?;
        Ok(body.tags)
    }
}
