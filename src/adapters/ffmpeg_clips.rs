//! ffmpeg CLI adapter: audio clip extraction and the startup version gate.

use crate::ports::clips::ClipExtractor;
use regex::Regex;
use std::error::Error;
use std::io;
use std::path::Path;
use std::process::{Command, Output};
use tracing::warn;

/// Oldest ffmpeg release the clip command line is known to work with.
pub const MIN_FFMPEG_VERSION: &str = "4.0";

/// Shells out to `ffmpeg` for a mono 16kHz 16-bit PCM WAV window. The audio
/// classifier expects exactly this format.
#[derive(Clone, Copy)]
pub struct FfmpegClipExtractor;

impl ClipExtractor for FfmpegClipExtractor {
    fn extract_clip(
        &self,
        video: &Path,
        start_secs: f64,
        duration_secs: f64,
        out_path: &Path,
    ) -> io::Result<Output> {
        Command::new("ffmpeg")
            .arg("-i")
            .arg(video)
            .arg("-ss")
            .arg(start_secs.to_string())
            .arg("-t")
            .arg(duration_secs.to_string())
            .arg("-vn")
            .arg("-acodec")
            .arg("pcm_s16le")
            .arg("-ar")
            .arg("16000")
            .arg("-ac")
            .arg("1")
            .arg("-loglevel")
            .arg("error")
            .arg(out_path)
            .arg("-y")
            .output()
    }
}

/// Verify at startup that the `ffmpeg` binary exists and is recent enough.
///
/// An unparsable version banner only logs a warning (distro builds mangle it
/// freely); a missing binary or a genuinely too-old release is fatal.
pub fn ensure_ffmpeg_version(minimum: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    let output = Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map_err(|e| format!("ffmpeg binary not found on PATH: {}", e))?;

    let banner = String::from_utf8_lossy(&output.stdout);
    match parse_ffmpeg_version(&banner) {
        Some(found) => {
            if version_at_least(&found, minimum) {
                Ok(())
            } else {
                Err(format!(
                    "ffmpeg {} is older than the required {}",
                    found, minimum
                )
                .into())
            }
        }
        None => {
            warn!("could not parse ffmpeg version banner; continuing anyway");
            Ok(())
        }
    }
}

/// Pull the dotted version out of an `ffmpeg -version` banner, tolerating
/// prefixes like `n7.1` and suffixes like `-3ubuntu5` or git hashes.
pub fn parse_ffmpeg_version(banner: &str) -> Option<String> {
    let re = Regex::new(r"ffmpeg version \D{0,2}(\d+(?:\.\d+)+)").unwrap();
    re.captures(banner)
        .map(|caps| caps.get(1).unwrap().as_str().to_string())
}

/// Numeric component-wise comparison. Plain string ordering gets this wrong
/// ("4.44.2" > "4.44.10" lexicographically); comparing components as numbers
/// does not. Missing or non-numeric components count as zero.
pub fn version_at_least(found: &str, minimum: &str) -> bool {
    let parse = |v: &str| -> Vec<u64> {
        v.split('.')
            .map(|part| part.parse::<u64>().unwrap_or(0))
            .collect()
    };
    let found = parse(found);
    let minimum = parse(minimum);

    for i in 0..found.len().max(minimum.len()) {
        let f = found.get(i).copied().unwrap_or(0);
        let m = minimum.get(i).copied().unwrap_or(0);
        if f != m {
            return f > m;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_compare_beats_lexicographic() {
        // The classic failure: "4.44.2" < "4.44.10" is false as strings.
        assert!(version_at_least("4.44.10", "4.44.2"));
        assert!(!version_at_least("4.44.2", "4.44.10"));
    }

    #[test]
    fn equal_and_shorter_versions() {
        assert!(version_at_least("4.0", "4.0"));
        assert!(version_at_least("4.0", "4"));
        assert!(version_at_least("4.0.1", "4.0"));
        assert!(!version_at_least("3.9.9", "4.0"));
    }

    #[test]
    fn parses_release_banner() {
        let banner = "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023 the FFmpeg developers";
        assert_eq!(parse_ffmpeg_version(banner).as_deref(), Some("6.1.1"));
    }

    #[test]
    fn parses_git_build_banner() {
        let banner = "ffmpeg version n7.1-29-g123abc Copyright (c) 2000-2024";
        assert_eq!(parse_ffmpeg_version(banner).as_deref(), Some("7.1"));
    }

    #[test]
    fn rejects_garbage_banner() {
        assert_eq!(parse_ffmpeg_version("not ffmpeg at all"), None);
    }
}
