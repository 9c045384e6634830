//! Render job status as reported to pollers.
//!
//! The job store persists [`ProjectStatus`] (`draft`, `rendering`, ...).
//! Pollers see [`JobStatus`] (`queued`, `processing`, ...). The two
//! vocabularies are bridged by [`STATUS_MAP`] and nowhere else.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::project::{Project, ProjectStatus};

/// Estimate reported while a render has not made measurable progress.
pub const DEFAULT_ETA_SECONDS: u64 = 60;

/// Render job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Not rendering yet
    #[default]
    Queued,
    /// Render in flight
    Processing,
    /// Video published
    Completed,
    /// Render attempt ended with an error
    Failed,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted status to job status.
pub const STATUS_MAP: [(ProjectStatus, JobStatus); 4] = [
    (ProjectStatus::Draft, JobStatus::Queued),
    (ProjectStatus::Rendering, JobStatus::Processing),
    (ProjectStatus::Completed, JobStatus::Completed),
    (ProjectStatus::Failed, JobStatus::Failed),
];

impl From<ProjectStatus> for JobStatus {
    fn from(status: ProjectStatus) -> Self {
        STATUS_MAP
            .iter()
            .find(|(persisted, _)| *persisted == status)
            .map(|(_, job)| *job)
            .unwrap_or_default()
    }
}

/// Snapshot returned by the status surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderStatus {
    pub status: JobStatus,

    /// Progress percentage (0-100)
    pub progress: u8,

    /// Seconds until completion (processing only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_url: Option<String>,

    /// Error message (failed only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenderStatus {
    /// Build the snapshot for `project` as of now.
    pub fn from_project(project: &Project) -> Self {
        Self::at(project, Utc::now())
    }

    /// Build the snapshot for `project` as of `now`.
    pub fn at(project: &Project, now: DateTime<Utc>) -> Self {
        let status = JobStatus::from(project.status);
        let progress = project
            .progress
            .unwrap_or_else(|| placeholder_progress(status))
            .min(100);

        let estimated_time_remaining = (status == JobStatus::Processing)
            .then(|| estimate_remaining(project.render_started_at, progress, now));

        Self {
            status,
            progress,
            estimated_time_remaining,
            video_url: (status == JobStatus::Completed)
                .then(|| project.video_url.clone())
                .flatten(),
            subtitle_url: (status == JobStatus::Completed)
                .then(|| project.subtitle_url.clone())
                .flatten(),
            error: (status == JobStatus::Failed)
                .then(|| project.error_message.clone())
                .flatten(),
        }
    }

    /// Check if the polled job has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Progress for rows that never stored one.
fn placeholder_progress(status: JobStatus) -> u8 {
    match status {
        JobStatus::Processing => 50,
        JobStatus::Completed => 100,
        JobStatus::Queued | JobStatus::Failed => 0,
    }
}

/// `elapsed * (100 - p) / p`, or the default when nothing is measurable yet.
fn estimate_remaining(started_at: Option<DateTime<Utc>>, progress: u8, now: DateTime<Utc>) -> u64 {
    let Some(started_at) = started_at else {
        return DEFAULT_ETA_SECONDS;
    };
    if progress == 0 {
        return DEFAULT_ETA_SECONDS;
    }

    let elapsed = (now - started_at).num_seconds().max(0) as u64;
    let progress = u64::from(progress.min(100));
    elapsed * (100 - progress) / progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_status_map_is_total_and_exact() {
        assert_eq!(JobStatus::from(ProjectStatus::Draft), JobStatus::Queued);
        assert_eq!(JobStatus::from(ProjectStatus::Rendering), JobStatus::Processing);
        assert_eq!(JobStatus::from(ProjectStatus::Completed), JobStatus::Completed);
        assert_eq!(JobStatus::from(ProjectStatus::Failed), JobStatus::Failed);

        let job_statuses: Vec<JobStatus> = STATUS_MAP.iter().map(|(_, j)| *j).collect();
        assert_eq!(job_statuses.len(), 4);
        for status in [
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert!(job_statuses.contains(&status));
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
    }

    #[test]
    fn test_placeholder_progress_for_legacy_rows() {
        let mut project = Project::new_draft("t", "a");
        assert_eq!(RenderStatus::from_project(&project).progress, 0);

        project.status = ProjectStatus::Rendering;
        assert_eq!(RenderStatus::from_project(&project).progress, 50);

        project.status = ProjectStatus::Completed;
        assert_eq!(RenderStatus::from_project(&project).progress, 100);
    }

    #[test]
    fn test_stored_progress_wins() {
        let mut project = Project::new_draft("t", "a");
        project.begin_render();
        project.record_progress(35);

        let status = RenderStatus::from_project(&project);
        assert_eq!(status.status, JobStatus::Processing);
        assert_eq!(status.progress, 35);
    }

    #[test]
    fn test_eta_scales_with_elapsed_time() {
        let mut project = Project::new_draft("t", "a");
        project.begin_render();
        project.record_progress(25);
        let started = project.render_started_at.unwrap();

        let status = RenderStatus::at(&project, started + Duration::seconds(30));
        assert_eq!(status.estimated_time_remaining, Some(90));
    }

    #[test]
    fn test_eta_defaults_before_progress() {
        let mut project = Project::new_draft("t", "a");
        project.begin_render();

        let status = RenderStatus::from_project(&project);
        assert_eq!(status.estimated_time_remaining, Some(DEFAULT_ETA_SECONDS));
    }

    #[test]
    fn test_urls_and_error_only_in_terminal_states() {
        let mut project = Project::new_draft("t", "a");
        project.video_url = Some("stale".into());
        let queued = RenderStatus::from_project(&project);
        assert!(queued.video_url.is_none());
        assert!(queued.estimated_time_remaining.is_none());

        project.begin_render();
        project.fail_render("Publish failed");
        let failed = RenderStatus::from_project(&project);
        assert_eq!(failed.error.as_deref(), Some("Publish failed"));
        assert!(failed.video_url.is_none());
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut project = Project::new_draft("t", "a");
        project.begin_render();
        let slides = project.slides.clone();
        project.complete_render("https://cdn.example/v.mp4", Some("https://cdn.example/s.srt".into()), slides);

        let json = serde_json::to_value(RenderStatus::from_project(&project)).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["progress"], 100);
        assert_eq!(json["videoUrl"], "https://cdn.example/v.mp4");
        assert_eq!(json["subtitleUrl"], "https://cdn.example/s.srt");
        assert!(json.get("estimatedTimeRemaining").is_none());
        assert!(json.get("error").is_none());
    }
}
