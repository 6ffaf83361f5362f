//! Request pipeline: probe, extract, tag, merge.

use crate::domain::av::frames::{extract_segments, ExtractedSegments};
use crate::domain::av::probe::{probe, VideoOpenError};
use crate::domain::merge::{merge_results, AudioReport, AudioTag, TaggedFrame, TaggedSegment};
use crate::ports::clips::ClipExtractor;
use crate::ports::taggers::{AudioTagger, FrameTagger, TagError};
use serde::Serialize;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::path::Path;
use tempfile::TempDir;
use tokio::task;
use tracing::info;

/// How many ranked audio tags survive per segment.
pub const TOP_AUDIO_TAGS: usize = 5;

/// Response body for a processed video.
#[derive(Debug, Serialize)]
pub struct ProcessReport {
    pub message: String,
    pub results: Vec<TaggedSegment>,
}

#[derive(Debug)]
pub enum PipelineError {
    /// The video could not be opened or decoded at all.
    VideoOpen(VideoOpenError),
    /// Batch captioning failed; unlike audio tagging this has no per-segment
    /// recovery.
    Captioning(TagError),
    Internal(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::VideoOpen(e) => write!(f, "{}", e),
            PipelineError::Captioning(e) => write!(f, "frame captioning failed: {}", e),
            PipelineError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl Error for PipelineError {}

impl From<VideoOpenError> for PipelineError {
    fn from(e: VideoOpenError) -> Self {
        PipelineError::VideoOpen(e)
    }
}

/// Sequences one request end to end. Generic over the three ports so tests
/// can substitute mocks for any of them.
pub struct ProcessService<C, F, A> {
    clips: C,
    frame_tagger: F,
    audio_tagger: A,
    audio_window_secs: f64,
}

impl<C, F, A> ProcessService<C, F, A>
where
    C: ClipExtractor,
    F: FrameTagger,
    A: AudioTagger,
{
    pub fn new(clips: C, frame_tagger: F, audio_tagger: A, audio_window_secs: f64) -> Self {
        Self {
            clips,
            frame_tagger,
            audio_tagger,
            audio_window_secs,
        }
    }

    /// Run the full pipeline for one uploaded video.
    ///
    /// The clip directory lives exactly as long as this call; it is removed
    /// on success and on every error path.
    pub async fn process(&self, video_path: &Path) -> Result<ProcessReport, PipelineError>
    where
        C: Clone + Send + 'static,
    {
        let info = {
            let path = video_path.to_path_buf();
            task::spawn_blocking(move || probe(&path))
                .await
                .map_err(|e| PipelineError::Internal(format!("probe task failed: {}", e)))??
        };

        // Roughly one segment per second of video, at least one.
        let requested_segments = (info.duration().floor() as usize).max(1);

        let clip_dir = TempDir::new()
            .map_err(|e| PipelineError::Internal(format!("failed to create clip dir: {}", e)))?;

        let extracted = {
            let path = video_path.to_path_buf();
            let dir = clip_dir.path().to_path_buf();
            let clips = self.clips.clone();
            let window = self.audio_window_secs;
            task::spawn_blocking(move || {
                extract_segments(&path, requested_segments, window, &dir, &clips)
            })
            .await
            .map_err(|e| PipelineError::Internal(format!("extraction task failed: {}", e)))??
        };
        info!(
            "extracted {} of {} requested segments from {:?}",
            extracted.len(),
            requested_segments,
            video_path
        );

        self.tag_and_merge(extracted).await
    }

    /// Caption the frames, classify each clip and merge on the segment
    /// index. A clip that is missing or fails to classify gets an empty tag
    /// list with an error reason; it never affects any other segment or the
    /// caption path.
    pub async fn tag_and_merge(
        &self,
        extracted: ExtractedSegments,
    ) -> Result<ProcessReport, PipelineError> {
        let ExtractedSegments {
            frames,
            clips,
            timestamps,
        } = extracted;

        let captions = self
            .frame_tagger
            .caption_frames(&frames)
            .await
            .map_err(PipelineError::Captioning)?;
        let tagged_frames: Vec<TaggedFrame> = captions
            .into_iter()
            .enumerate()
            .map(|(index, caption)| TaggedFrame {
                index,
                caption: Some(caption),
                timestamp: timestamps.get(index).copied().unwrap_or(0.0),
            })
            .collect();

        let mut audio_reports = Vec::with_capacity(clips.len());
        for (index, clip) in clips.iter().enumerate() {
            let timestamp = timestamps.get(index).copied().unwrap_or(0.0);
            let report = match clip {
                Some(path) => match self.audio_tagger.tag_clip(path).await {
                    Ok(tags) => AudioReport {
                        index,
                        tags: top_tags(tags),
                        timestamp,
                        error: None,
                    },
                    Err(e) => AudioReport {
                        index,
                        tags: Vec::new(),
                        timestamp,
                        error: Some(e.to_string()),
                    },
                },
                None => AudioReport {
                    index,
                    tags: Vec::new(),
                    timestamp,
                    error: Some("no audio clip extracted".to_string()),
                },
            };
            audio_reports.push(report);
        }

        let message = format!(
            "{} frames tagged, {} audio segments classified",
            tagged_frames.len(),
            audio_reports.len()
        );
        let results = merge_results(tagged_frames, audio_reports, &timestamps);
        Ok(ProcessReport { message, results })
    }
}

fn top_tags(mut tags: Vec<AudioTag>) -> Vec<AudioTag> {
    tags.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    tags.truncate(TOP_AUDIO_TAGS);
    tags
}
