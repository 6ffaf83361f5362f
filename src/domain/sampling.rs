//! Sample plan for segment extraction.
//!
//! Everything here is pure arithmetic over the video's frame timeline; the
//! decoding side (`domain::av::frames`) consumes the plan without ever
//! recomputing it. Keeping the plan separate is what guarantees that frames,
//! audio clips and timestamps stay index-aligned no matter which extraction
//! path fails.

/// Spacing between consecutive sample points, in frames. Never below 1.
pub fn sample_interval(total_frames: u64, requested_segments: usize) -> u64 {
    if requested_segments == 0 {
        return 1;
    }
    (total_frames / requested_segments as u64).max(1)
}

/// Frame indices at which segments are taken.
///
/// At most `requested_segments` entries, strictly increasing, every entry
/// below `total_frames`. When the video has fewer frames than requested the
/// plan simply ends early; the extractor reports a shorter result rather
/// than an error.
pub fn sample_indices(total_frames: u64, requested_segments: usize) -> Vec<u64> {
    let interval = sample_interval(total_frames, requested_segments);
    (0..requested_segments as u64)
        .map(|i| i * interval)
        .take_while(|&index| index < total_frames)
        .collect()
}

/// Audio window of `window_secs` centered on `timestamp`, clamped so the
/// start never goes negative. Returns `(start_secs, duration_secs)`.
pub fn clip_window(timestamp: f64, window_secs: f64) -> (f64, f64) {
    ((timestamp - window_secs / 2.0).max(0.0), window_secs)
}

/// Round a timestamp to millisecond precision.
pub fn round_to_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_second_video_at_thirty_fps() {
        // 300 frames at 30fps, 10 segments: one sample per second.
        assert_eq!(sample_interval(300, 10), 30);
        let indices = sample_indices(300, 10);
        assert_eq!(indices, vec![0, 30, 60, 90, 120, 150, 180, 210, 240, 270]);
    }

    #[test]
    fn plan_length_is_min_of_requested_and_total() {
        for total_frames in 1..=60 {
            for requested in 1..=15 {
                let indices = sample_indices(total_frames, requested);
                assert_eq!(
                    indices.len(),
                    requested.min(total_frames as usize),
                    "total_frames={} requested={}",
                    total_frames,
                    requested
                );
                assert!(indices.iter().all(|&i| i < total_frames));
                assert!(indices.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn more_segments_than_frames() {
        assert_eq!(sample_indices(5, 10), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn degenerate_requests() {
        assert!(sample_indices(300, 0).is_empty());
        assert!(sample_indices(0, 10).is_empty());
        assert_eq!(sample_interval(300, 0), 1);
    }

    #[test]
    fn window_clamps_at_zero() {
        assert_eq!(clip_window(0.0, 1.0), (0.0, 1.0));
        assert_eq!(clip_window(0.2, 1.0), (0.0, 1.0));
        assert_eq!(clip_window(5.0, 1.0), (4.5, 1.0));
    }

    #[test]
    fn millisecond_rounding() {
        assert_eq!(round_to_millis(1.0 / 3.0), 0.333);
        assert_eq!(round_to_millis(2.0 / 3.0), 0.667);
        assert_eq!(round_to_millis(9.0), 9.0);
    }
}
