use ffmpeg_next as ffmpeg;
use std::error::Error;
use std::fmt;
use std::path::Path;

/// Fatal tier: the source cannot be opened or decoded at all.
#[derive(Debug)]
pub struct VideoOpenError(pub String);

impl fmt::Display for VideoOpenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for VideoOpenError {}

/// Frame-timeline metadata for an opened video.
///
/// `frame_rate` is 0.0 when the container does not report one; duration is
/// derived, never read from the container, so the probe and the extractor
/// agree on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub total_frames: u64,
    pub frame_rate: f64,
}

impl VideoInfo {
    pub fn duration(&self) -> f64 {
        if self.frame_rate > 0.0 {
            self.total_frames as f64 / self.frame_rate
        } else {
            0.0
        }
    }
}

/// Read `VideoInfo` from the best video stream of `path`.
///
/// A container without a video stream probes as zero frames / zero rate:
/// downstream that is a legitimate empty result, not an open failure.
pub fn probe(path: &Path) -> Result<VideoInfo, VideoOpenError> {
    ffmpeg::init()
        .map_err(|e| VideoOpenError(format!("failed to initialize ffmpeg: {}", e)))?;

    let ictx = ffmpeg::format::input(&path)
        .map_err(|e| VideoOpenError(format!("failed to open video {:?}: {}", path, e)))?;

    Ok(match ictx.streams().best(ffmpeg::media::Type::Video) {
        Some(stream) => stream_info(&stream),
        None => VideoInfo {
            total_frames: 0,
            frame_rate: 0.0,
        },
    })
}

pub(crate) fn stream_info(stream: &ffmpeg::Stream) -> VideoInfo {
    let rate = stream.avg_frame_rate();
    let frame_rate = if rate.denominator() != 0 {
        rate.numerator() as f64 / rate.denominator() as f64
    } else {
        0.0
    };

    let mut total_frames = stream.frames().max(0) as u64;
    if total_frames == 0 && frame_rate > 0.0 {
        // Some containers omit nb_frames; estimate from the stream duration.
        let time_base = stream.time_base();
        let seconds = stream.duration() as f64 * time_base.numerator() as f64
            / time_base.denominator() as f64;
        if seconds > 0.0 {
            total_frames = (seconds * frame_rate).round() as u64;
        }
    }

    VideoInfo {
        total_frames,
        frame_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_derives_from_frame_count_and_rate() {
        let info = VideoInfo {
            total_frames: 300,
            frame_rate: 30.0,
        };
        assert_eq!(info.duration(), 10.0);
    }

    #[test]
    fn unknown_rate_means_zero_duration() {
        let info = VideoInfo {
            total_frames: 300,
            frame_rate: 0.0,
        };
        assert_eq!(info.duration(), 0.0);
    }

    #[test]
    fn open_error_on_missing_file() {
        let err = probe(Path::new("/nonexistent/clip.mp4")).unwrap_err();
        assert!(err.to_string().contains("failed to open video"));
    }
}
