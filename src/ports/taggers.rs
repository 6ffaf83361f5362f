use crate::domain::merge::AudioTag;
use async_trait::async_trait;
use image::RgbImage;
use std::error::Error;
use std::fmt;
use std::path::Path;

/// Failure reported by a tagging backend.
#[derive(Debug)]
pub struct TagError(pub String);

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for TagError {}

/// Captioning backend: one caption per input frame, same order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameTagger: Send + Sync {
    async fn caption_frames(&self, frames: &[RgbImage]) -> Result<Vec<String>, TagError>;
}

/// Audio event classifier: labels ranked by score descending. The caller
/// truncates to its own top-k.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioTagger: Send + Sync {
    async fn tag_clip(&self, clip: &Path) -> Result<Vec<AudioTag>, TagError>;
}
