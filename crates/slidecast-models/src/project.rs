//! Project records as persisted by the job store.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::editor::total_duration;
use crate::segment::segment;
use crate::settings::ProjectSettings;
use crate::slide::Slide;

/// Unique identifier for a project. Doubles as the render job id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Generate a new random project ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted project status.
///
/// This is the store's vocabulary. The job-status vocabulary reported to
/// pollers is [`crate::JobStatus`]; see [`crate::STATUS_MAP`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Draft,
    Rendering,
    Completed,
    Failed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::Rendering => "rendering",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lecture project: script, slides, settings and render state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Project {
    pub id: ProjectId,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub status: ProjectStatus,

    /// Raw script the slides were segmented from
    #[serde(default)]
    pub script: String,

    #[serde(default)]
    pub slides: Vec<Slide>,

    #[serde(default)]
    pub settings: ProjectSettings,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_url: Option<String>,

    /// Sum of slide durations
    #[serde(default)]
    pub duration_seconds: u32,

    /// Render progress (0-100); absent on rows written before progress tracking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,

    /// Error message (if the last render failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_started_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a draft project, segmenting `script` into its initial slides.
    pub fn new_draft(title: impl Into<String>, script: impl Into<String>) -> Self {
        let script = script.into();
        let slides = segment(&script);
        let now = Utc::now();

        Self {
            id: ProjectId::new(),
            title: title.into(),
            status: ProjectStatus::Draft,
            duration_seconds: total_duration(&slides),
            script,
            slides,
            settings: ProjectSettings::default(),
            video_url: None,
            subtitle_url: None,
            progress: None,
            error_message: None,
            render_started_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder-style settings override.
    pub fn with_settings(mut self, settings: ProjectSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the slide list wholesale.
    pub fn replace_slides(&mut self, script: Option<String>, slides: Vec<Slide>) {
        if let Some(script) = script {
            self.script = script;
        }
        self.duration_seconds = total_duration(&slides);
        self.slides = slides;
        self.updated_at = Utc::now();
    }

    /// Enter `rendering`: progress 0, previous error and results cleared.
    pub fn begin_render(&mut self) {
        let now = Utc::now();
        self.status = ProjectStatus::Rendering;
        self.progress = Some(0);
        self.error_message = None;
        self.video_url = None;
        self.subtitle_url = None;
        self.render_started_at = Some(now);
        self.updated_at = now;
    }

    /// Record progress. Never moves backwards and ignores non-rendering rows.
    pub fn record_progress(&mut self, progress: u8) {
        if self.status != ProjectStatus::Rendering {
            return;
        }
        let progress = progress.min(100);
        let current = self.progress.unwrap_or(0);
        if progress > current {
            self.progress = Some(progress);
            self.updated_at = Utc::now();
        }
    }

    /// Liveness heartbeat from the worker. Only refreshes `rendering` rows.
    pub fn touch(&mut self) {
        if self.status == ProjectStatus::Rendering {
            self.updated_at = Utc::now();
        }
    }

    /// Enter `completed` with the published result.
    pub fn complete_render(
        &mut self,
        video_url: impl Into<String>,
        subtitle_url: Option<String>,
        slides: Vec<Slide>,
    ) {
        self.status = ProjectStatus::Completed;
        self.progress = Some(100);
        self.video_url = Some(video_url.into());
        self.subtitle_url = subtitle_url;
        self.duration_seconds = total_duration(&slides);
        self.slides = slides;
        self.updated_at = Utc::now();
    }

    /// Enter `failed`. Progress stays at its last value.
    pub fn fail_render(&mut self, error: impl Into<String>) {
        self.status = ProjectStatus::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
    }

    /// True while a render is in flight and still reporting.
    ///
    /// A `rendering` row whose last update is older than
    /// `stale_after_secs` is treated as abandoned.
    pub fn has_active_render(&self, stale_after_secs: i64) -> bool {
        self.status == ProjectStatus::Rendering
            && (Utc::now() - self.updated_at).num_seconds() <= stale_after_secs
    }
}
