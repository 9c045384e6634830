//! The job store seam.

use async_trait::async_trait;

use slidecast_models::{Project, ProjectId, RenderStatus, Slide};

use crate::error::StoreResult;

/// Everything written when a render completes.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRender {
    pub video_url: String,
    pub subtitle_url: Option<String>,
    /// Slides with final durations and asset URLs
    pub slides: Vec<Slide>,
}

/// Persistent record of projects and their render state.
///
/// Implementations write whole fields (last writer wins), except
/// [`JobStore::update_progress`], which must never lower stored progress.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_project(&self, project: &Project) -> StoreResult<()>;

    async fn get_project(&self, id: &ProjectId) -> StoreResult<Option<Project>>;

    /// Replace the slide list wholesale, optionally with the script it came from.
    async fn replace_slides(&self, id: &ProjectId, script: Option<&str>, slides: &[Slide]) -> StoreResult<()>;

    /// Enter `rendering` with progress 0 and the previous error cleared.
    async fn mark_rendering(&self, id: &ProjectId) -> StoreResult<()>;

    /// Raise progress while rendering. Lower values are ignored.
    async fn update_progress(&self, id: &ProjectId, progress: u8) -> StoreResult<()>;

    /// Refresh `updated_at` of a `rendering` row without touching progress.
    ///
    /// The worker calls this periodically so a long step is not mistaken
    /// for an abandoned render. Rows in any other state are left alone.
    async fn touch(&self, id: &ProjectId) -> StoreResult<()>;

    async fn complete_render(&self, id: &ProjectId, result: &CompletedRender) -> StoreResult<()>;

    async fn fail_render(&self, id: &ProjectId, error: &str) -> StoreResult<()>;

    /// Status snapshot for pollers.
    async fn get_status(&self, id: &ProjectId) -> StoreResult<Option<RenderStatus>> {
        Ok(self
            .get_project(id)
            .await?
            .map(|project| RenderStatus::from_project(&project)))
    }
}
