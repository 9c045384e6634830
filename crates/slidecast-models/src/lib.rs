//! Shared data models for the Slidecast backend.
//!
//! This crate provides Serde-serializable types for:
//! - Slides and their templates
//! - Project settings (theme, font, voice)
//! - Project records as persisted by the job store
//! - Render job status and the persisted/job status mapping
//!
//! It also hosts the pure script segmenter, slide list editing helpers and
//! the subtitle writer, which have no I/O dependencies.

pub mod editor;
pub mod job_status;
pub mod project;
pub mod segment;
pub mod settings;
pub mod slide;
pub mod subtitles;

// Re-export common types
pub use job_status::{JobStatus, RenderStatus, STATUS_MAP};
pub use project::{Project, ProjectId, ProjectStatus};
pub use segment::{
    estimate_duration_seconds, segment, segment_checked, SegmentError, SegmentResult,
    SHORT_FORM_THRESHOLD,
};
pub use settings::{ColorTheme, ProjectSettings, VoiceType};
pub use slide::{Slide, SlideTemplate};
pub use subtitles::build_srt;
