//! Segment extraction: aligned frames, audio clips and timestamps.
//!
//! Frames are decoded sequentially from index 0 and matched against the
//! sample plan; for every sample point the extractor emits a decoded RGB
//! frame, a best-effort audio clip and the millisecond-rounded timestamp,
//! all at the same index. Audio extraction can fail per segment (the slot
//! becomes `None`); only a video that cannot be opened or decoded at all
//! aborts the extraction.

use crate::domain::av::probe::{stream_info, VideoOpenError};
use crate::domain::sampling::{clip_window, round_to_millis, sample_indices};
use crate::ports::clips::ClipExtractor;
use ffmpeg_next as ffmpeg;
use image::RgbImage;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Index-aligned output of the extractor. `clips[i]` is `None` when audio
/// extraction failed for segment `i`; `frames[i]` and `timestamps[i]` are
/// still populated.
#[derive(Debug, Default)]
pub struct ExtractedSegments {
    pub frames: Vec<RgbImage>,
    pub clips: Vec<Option<PathBuf>>,
    pub timestamps: Vec<f64>,
}

impl ExtractedSegments {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Decode `video_path` and take up to `requested_segments` evenly spaced
/// segments, writing audio clips into `clip_dir`.
///
/// A zero-duration video (including one with no video stream) yields the
/// empty result. A stream that ends before every sample point is reached
/// yields a shorter result. Both are legitimate, not errors. The ffmpeg
/// input context is dropped on every path out of this function.
///
/// Blocking; callers on the async runtime wrap this in `spawn_blocking`.
pub fn extract_segments<C: ClipExtractor>(
    video_path: &Path,
    requested_segments: usize,
    audio_window_secs: f64,
    clip_dir: &Path,
    clips: &C,
) -> Result<ExtractedSegments, VideoOpenError> {
    ffmpeg::init()
        .map_err(|e| VideoOpenError(format!("failed to initialize ffmpeg: {}", e)))?;

    let mut ictx = ffmpeg::format::input(&video_path)
        .map_err(|e| VideoOpenError(format!("failed to open video {:?}: {}", video_path, e)))?;

    let (stream_index, parameters, info) =
        match ictx.streams().best(ffmpeg::media::Type::Video) {
            Some(stream) => (stream.index(), stream.parameters(), stream_info(&stream)),
            None => return Ok(ExtractedSegments::default()),
        };

    if info.duration() <= 0.0 {
        return Ok(ExtractedSegments::default());
    }

    let mut decoder = ffmpeg::codec::context::Context::from_parameters(parameters)
        .map_err(|e| VideoOpenError(format!("failed to create decoder context: {}", e)))?
        .decoder()
        .video()
        .map_err(|e| VideoOpenError(format!("failed to create video decoder: {}", e)))?;

    let scaler = ffmpeg::software::scaling::context::Context::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        ffmpeg::format::Pixel::RGB24,
        decoder.width(),
        decoder.height(),
        ffmpeg::software::scaling::flag::Flags::BILINEAR,
    )
    .map_err(|e| VideoOpenError(format!("failed to create scaler: {}", e)))?;

    let mut collector = SampleCollector {
        targets: sample_indices(info.total_frames, requested_segments)
            .into_iter()
            .peekable(),
        position: 0,
        frame_rate: info.frame_rate,
        scaler,
        video_path,
        clip_dir,
        audio_window_secs,
        clips,
        out: ExtractedSegments::default(),
    };

    let mut decoded = ffmpeg::util::frame::video::Video::empty();
    let mut done = collector.targets.peek().is_none();

    if !done {
        'packets: for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder.send_packet(&packet).ok();
            while decoder.receive_frame(&mut decoded).is_ok() {
                if collector.offer(&decoded)? {
                    done = true;
                    break 'packets;
                }
            }
        }
    }

    if !done {
        // Drain the decoder so sample points near the end of a short or
        // truncated stream are still reached.
        decoder.send_eof().ok();
        while decoder.receive_frame(&mut decoded).is_ok() {
            if collector.offer(&decoded)? {
                break;
            }
        }
    }

    Ok(collector.out)
}

struct SampleCollector<'a, C: ClipExtractor> {
    targets: Peekable<std::vec::IntoIter<u64>>,
    position: u64,
    frame_rate: f64,
    scaler: ffmpeg::software::scaling::context::Context,
    video_path: &'a Path,
    clip_dir: &'a Path,
    audio_window_secs: f64,
    clips: &'a C,
    out: ExtractedSegments,
}

impl<C: ClipExtractor> SampleCollector<'_, C> {
    /// Consume one decoded frame; returns true once every sample point has
    /// been taken.
    fn offer(
        &mut self,
        decoded: &ffmpeg::util::frame::video::Video,
    ) -> Result<bool, VideoOpenError> {
        let position = self.position;
        self.position += 1;

        if self.targets.peek() != Some(&position) {
            return Ok(false);
        }
        self.targets.next();

        let timestamp = if self.frame_rate > 0.0 {
            round_to_millis(position as f64 / self.frame_rate)
        } else {
            0.0
        };

        let mut rgb = ffmpeg::util::frame::video::Video::empty();
        self.scaler.run(decoded, &mut rgb).map_err(|e| {
            VideoOpenError(format!(
                "failed to convert frame at {}s to RGB: {}",
                timestamp, e
            ))
        })?;
        let image = rgb_image(&rgb).ok_or_else(|| {
            VideoOpenError(format!(
                "failed to build image buffer for frame at {}s",
                timestamp
            ))
        })?;

        let clip = self.extract_clip(timestamp);
        self.out.frames.push(image);
        self.out.timestamps.push(timestamp);
        self.out.clips.push(clip);

        Ok(self.targets.peek().is_none())
    }

    fn extract_clip(&self, timestamp: f64) -> Option<PathBuf> {
        let (start, length) = clip_window(timestamp, self.audio_window_secs);
        let out_path = self
            .clip_dir
            .join(format!("clip_{:04}.wav", self.out.frames.len()));

        match self
            .clips
            .extract_clip(self.video_path, start, length, &out_path)
        {
            Ok(output) if output.status.success() => Some(out_path),
            Ok(output) => {
                warn!(
                    "audio clip extraction failed at {}s: {}",
                    timestamp,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                None
            }
            Err(e) => {
                warn!("audio clip extraction failed at {}s: {}", timestamp, e);
                None
            }
        }
    }
}

// Scaler output lines are padded to the slice stride; copy row by row.
fn rgb_image(frame: &ffmpeg::util::frame::video::Video) -> Option<RgbImage> {
    let width = frame.width();
    let height = frame.height();
    let stride = frame.stride(0);
    let row_len = width as usize * 3;

    let mut data = Vec::with_capacity(row_len * height as usize);
    for row in frame.data(0).chunks(stride).take(height as usize) {
        data.extend_from_slice(row.get(..row_len)?);
    }
    RgbImage::from_raw(width, height, data)
}
