use std::io;
use std::path::Path;
use std::process::Output;

/// Seam over the external audio transcode step.
///
/// Called from the blocking decode loop, so the trait is synchronous. The
/// extractor inspects `Output::status` itself; an unsuccessful exit is a
/// per-segment failure, never a pipeline error.
#[cfg_attr(test, mockall::automock)]
pub trait ClipExtractor: Send + Sync {
    fn extract_clip(
        &self,
        video: &Path,
        start_secs: f64,
        duration_secs: f64,
        out_path: &Path,
    ) -> io::Result<Output>;
}
