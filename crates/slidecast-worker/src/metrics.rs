//! Render metrics.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Renders accepted by the orchestrator.
    pub const RENDERS_STARTED: &str = "slidecast_renders_started_total";
    /// Renders that reached `completed`.
    pub const RENDERS_COMPLETED: &str = "slidecast_renders_completed_total";
    /// Renders that reached `failed`, by error kind.
    pub const RENDERS_FAILED: &str = "slidecast_renders_failed_total";
    /// `start_render` calls ignored because a render was already active.
    pub const RENDERS_DEDUPLICATED: &str = "slidecast_renders_deduplicated_total";
    /// Slides drawn with the error card.
    pub const SLIDE_IMAGE_FALLBACKS: &str = "slidecast_slide_image_fallbacks_total";
    /// Per-slide asset uploads that failed.
    pub const SLIDE_PUBLISH_FAILURES: &str = "slidecast_slide_publish_failures_total";
    /// Wall time of video assembly.
    pub const ASSEMBLY_DURATION: &str = "slidecast_assembly_duration_seconds";
    /// Wall time of a whole render.
    pub const RENDER_DURATION: &str = "slidecast_render_duration_seconds";

    pub use slidecast_tts::NARRATION_FALLBACKS_TOTAL as NARRATION_FALLBACKS;
}

pub fn record_render_started() {
    counter!(names::RENDERS_STARTED).increment(1);
}

pub fn record_render_deduplicated() {
    counter!(names::RENDERS_DEDUPLICATED).increment(1);
}

pub fn record_render_completed(duration_secs: f64) {
    counter!(names::RENDERS_COMPLETED).increment(1);
    histogram!(names::RENDER_DURATION, "outcome" => "completed").record(duration_secs);
}

pub fn record_render_failed(kind: &'static str, duration_secs: f64) {
    counter!(names::RENDERS_FAILED, "kind" => kind).increment(1);
    histogram!(names::RENDER_DURATION, "outcome" => "failed").record(duration_secs);
}

pub fn record_slide_image_fallback() {
    counter!(names::SLIDE_IMAGE_FALLBACKS).increment(1);
}

pub fn record_slide_publish_failure(asset: &'static str) {
    counter!(names::SLIDE_PUBLISH_FAILURES, "asset" => asset).increment(1);
}

pub fn record_assembly_duration(duration_secs: f64) {
    histogram!(names::ASSEMBLY_DURATION).record(duration_secs);
}
