//! Structured render logging.

use tracing::{error, info, warn, Span};

use slidecast_models::ProjectId;

/// Logger carrying the project id and render attempt for every line.
#[derive(Debug, Clone)]
pub struct JobLogger {
    project_id: String,
    attempt: String,
}

impl JobLogger {
    /// Logger for one render attempt of `project_id`.
    pub fn new(project_id: &ProjectId, attempt: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            attempt: attempt.to_string(),
        }
    }

    pub fn log_start(&self, slide_count: usize) {
        info!(
            project_id = %self.project_id,
            attempt = %self.attempt,
            slide_count,
            "Render started"
        );
    }

    pub fn log_progress(&self, progress: u8, message: &str) {
        info!(
            project_id = %self.project_id,
            attempt = %self.attempt,
            progress,
            "Render progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            project_id = %self.project_id,
            attempt = %self.attempt,
            "Render warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            project_id = %self.project_id,
            attempt = %self.attempt,
            "Render failed: {}", message
        );
    }

    pub fn log_completion(&self, video_url: &str, duration_seconds: u32) {
        info!(
            project_id = %self.project_id,
            attempt = %self.attempt,
            duration_seconds,
            video_url = %video_url,
            "Render completed"
        );
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn attempt(&self) -> &str {
        &self.attempt
    }

    /// Span wrapping the whole render task.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "render",
            project_id = %self.project_id,
            attempt = %self.attempt
        )
    }
}
