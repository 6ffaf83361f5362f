//! Chaplin - Video Segment Tagging Service
//!
//! Accepts an uploaded video, samples it into time-aligned frame/audio
//! segments and returns per-segment captions and ranked audio-event tags.
//!
//! Layout:
//! - domain/: Pure business logic (sample plan, extraction, merge)
//! - ports/: Trait definitions for the external collaborators
//! - adapters/: Concrete implementations (ffmpeg CLI, inference sidecars)
//! - application/: The request pipeline
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports for convenience
pub use application::pipeline::{PipelineError, ProcessReport, ProcessService};
pub use config::Config;
pub use domain::av::frames::ExtractedSegments;
pub use domain::merge::TaggedSegment;
