//! Result types and the index-aligned merge.
//!
//! The merge is the system's robustness guarantee: captions and audio tags
//! come from independently-fallible paths, and one modality's failure must
//! never suppress the other's results. Everything joins on the segment index.

use serde::{Deserialize, Serialize};

/// One ranked audio label with its classifier score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTag {
    pub label: String,
    pub score: f64,
}

/// Caption result for one sampled frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedFrame {
    pub index: usize,
    pub caption: Option<String>,
    pub timestamp: f64,
}

/// Audio classification result for one segment. `error` carries the reason
/// when the clip could not be extracted or tagged; the segment still appears
/// in the output with empty tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioReport {
    pub index: usize,
    pub tags: Vec<AudioTag>,
    pub timestamp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final merge unit exposed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedSegment {
    pub index: usize,
    pub frame: TaggedFrame,
    pub audio: AudioReport,
}

/// Join tagged frames and audio reports on the segment index.
///
/// The result always has `max(tagged_frames.len(), audio_reports.len())`
/// entries. An index missing from the shorter side is filled with a
/// placeholder (no caption / empty tags) carrying the timestamp for that
/// index, or 0.0 when the timestamp vector is itself too short. Length
/// mismatches are expected, never an error.
pub fn merge_results(
    tagged_frames: Vec<TaggedFrame>,
    audio_reports: Vec<AudioReport>,
    timestamps: &[f64],
) -> Vec<TaggedSegment> {
    let len = tagged_frames.len().max(audio_reports.len());
    let mut frames = tagged_frames.into_iter();
    let mut reports = audio_reports.into_iter();

    (0..len)
        .map(|index| {
            let timestamp = timestamps.get(index).copied().unwrap_or(0.0);
            let frame = frames.next().unwrap_or(TaggedFrame {
                index,
                caption: None,
                timestamp,
            });
            let audio = reports.next().unwrap_or(AudioReport {
                index,
                tags: Vec::new(),
                timestamp,
                error: None,
            });
            TaggedSegment {
                index,
                frame,
                audio,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: usize, caption: &str) -> TaggedFrame {
        TaggedFrame {
            index,
            caption: Some(caption.to_string()),
            timestamp: index as f64,
        }
    }

    fn report(index: usize, error: Option<&str>) -> AudioReport {
        AudioReport {
            index,
            tags: vec![AudioTag {
                label: "speech".to_string(),
                score: 0.9,
            }],
            timestamp: index as f64,
            error: error.map(String::from),
        }
    }

    #[test]
    fn equal_lengths_join_one_to_one() {
        let frames = vec![frame(0, "a"), frame(1, "b")];
        let reports = vec![report(0, None), report(1, None)];
        let merged = merge_results(frames, reports, &[0.0, 1.0]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].index, 1);
        assert_eq!(merged[1].frame.caption.as_deref(), Some("b"));
        assert_eq!(merged[1].audio.tags.len(), 1);
    }

    #[test]
    fn more_audio_than_frames_pads_captions() {
        // Three captioned frames against five audio reports, the last two of
        // which failed. Entries 3 and 4 must exist with a null caption.
        let frames = vec![frame(0, "a"), frame(1, "b"), frame(2, "c")];
        let reports = vec![
            report(0, None),
            report(1, None),
            report(2, None),
            report(3, Some("no audio clip extracted")),
            report(4, Some("classifier failed")),
        ];
        let timestamps = [0.0, 1.0, 2.0, 3.0, 4.0];
        let merged = merge_results(frames, reports, &timestamps);

        assert_eq!(merged.len(), 5);
        for entry in &merged[..3] {
            assert!(entry.frame.caption.is_some());
        }
        for (idx, entry) in merged[3..].iter().enumerate() {
            assert_eq!(entry.frame.caption, None);
            assert_eq!(entry.frame.timestamp, timestamps[idx + 3]);
        }
        assert_eq!(
            merged[3].audio.error.as_deref(),
            Some("no audio clip extracted")
        );
    }

    #[test]
    fn more_frames_than_audio_pads_tags() {
        let frames = vec![frame(0, "a"), frame(1, "b"), frame(2, "c")];
        let reports = vec![report(0, None)];
        let merged = merge_results(frames, reports, &[0.0, 1.0, 2.0]);

        assert_eq!(merged.len(), 3);
        assert!(merged[2].audio.tags.is_empty());
        assert_eq!(merged[2].audio.error, None);
        assert_eq!(merged[2].audio.timestamp, 2.0);
    }

    #[test]
    fn empty_inputs_merge_to_empty() {
        assert!(merge_results(Vec::new(), Vec::new(), &[]).is_empty());
    }

    #[test]
    fn short_timestamp_vector_never_panics() {
        let frames = vec![frame(0, "a")];
        let reports = vec![report(0, None), report(1, None), report(2, None)];
        let merged = merge_results(frames, reports, &[0.0]);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[2].frame.timestamp, 0.0);
    }

    #[test]
    fn error_field_is_omitted_from_json_when_absent() {
        let merged = merge_results(vec![frame(0, "a")], vec![report(0, None)], &[0.0]);
        let json = serde_json::to_value(&merged).unwrap();
        assert!(json[0]["audio"].get("error").is_none());
        assert_eq!(json[0]["frame"]["caption"], "a");
    }
}
