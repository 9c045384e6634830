//! In-process job store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use slidecast_models::{Project, ProjectId, Slide};

use crate::error::{StoreError, StoreResult};
use crate::store::{CompletedRender, JobStore};

/// Job store backed by a map. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    projects: RwLock<HashMap<ProjectId, Project>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `f` to a stored project.
    async fn update<F>(&self, id: &ProjectId, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Project) + Send,
    {
        let mut projects = self.projects.write().await;
        let project = projects
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(id.as_str()))?;
        f(project);
        Ok(())
    }

    /// Number of stored projects.
    pub async fn len(&self) -> usize {
        self.projects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.projects.read().await.is_empty()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create_project(&self, project: &Project) -> StoreResult<()> {
        let mut projects = self.projects.write().await;
        if projects.contains_key(&project.id) {
            return Err(StoreError::AlreadyExists(project.id.to_string()));
        }
        projects.insert(project.id.clone(), project.clone());
        Ok(())
    }

    async fn get_project(&self, id: &ProjectId) -> StoreResult<Option<Project>> {
        Ok(self.projects.read().await.get(id).cloned())
    }

    async fn replace_slides(&self, id: &ProjectId, script: Option<&str>, slides: &[Slide]) -> StoreResult<()> {
        let script = script.map(str::to_string);
        let slides = slides.to_vec();
        self.update(id, move |p| p.replace_slides(script, slides)).await
    }

    async fn mark_rendering(&self, id: &ProjectId) -> StoreResult<()> {
        self.update(id, Project::begin_render).await
    }

    async fn update_progress(&self, id: &ProjectId, progress: u8) -> StoreResult<()> {
        self.update(id, |p| p.record_progress(progress)).await
    }

    async fn touch(&self, id: &ProjectId) -> StoreResult<()> {
        self.update(id, Project::touch).await
    }

    async fn complete_render(&self, id: &ProjectId, result: &CompletedRender) -> StoreResult<()> {
        let result = result.clone();
        self.update(id, move |p| {
            p.complete_render(result.video_url, result.subtitle_url, result.slides)
        })
        .await
    }

    async fn fail_render(&self, id: &ProjectId, error: &str) -> StoreResult<()> {
        self.update(id, |p| p.fail_render(error)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidecast_models::{JobStatus, ProjectStatus};

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryJobStore::new();
        let project = Project::new_draft("Lecture", "one\n---\ntwo");
        store.create_project(&project).await.unwrap();

        let loaded = store.get_project(&project.id).await.unwrap().unwrap();
        assert_eq!(loaded, project);
        assert!(store.get_project(&ProjectId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let store = MemoryJobStore::new();
        let project = Project::new_draft("Lecture", "one");
        store.create_project(&project).await.unwrap();

        assert!(matches!(
            store.create_project(&project).await,
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_progress_never_decreases() {
        let store = MemoryJobStore::new();
        let project = Project::new_draft("Lecture", "one");
        store.create_project(&project).await.unwrap();
        store.mark_rendering(&project.id).await.unwrap();

        store.update_progress(&project.id, 60).await.unwrap();
        store.update_progress(&project.id, 30).await.unwrap();

        let status = store.get_status(&project.id).await.unwrap().unwrap();
        assert_eq!(status.status, JobStatus::Processing);
        assert_eq!(status.progress, 60);
    }

    #[tokio::test]
    async fn test_touch_refreshes_rendering_row() {
        let store = MemoryJobStore::new();
        let project = Project::new_draft("Lecture", "one");
        store.create_project(&project).await.unwrap();
        store.mark_rendering(&project.id).await.unwrap();
        store.update_progress(&project.id, 90).await.unwrap();

        {
            let mut projects = store.projects.write().await;
            let row = projects.get_mut(&project.id).unwrap();
            row.updated_at = chrono::Utc::now() - chrono::Duration::seconds(120);
        }
        let stale = store.get_project(&project.id).await.unwrap().unwrap();
        assert!(!stale.has_active_render(60));

        store.touch(&project.id).await.unwrap();
        let fresh = store.get_project(&project.id).await.unwrap().unwrap();
        assert!(fresh.has_active_render(60));
        assert_eq!(fresh.progress, Some(90));
    }

    #[tokio::test]
    async fn test_complete_and_fail() {
        let store = MemoryJobStore::new();
        let project = Project::new_draft("Lecture", "one\n---\ntwo");
        store.create_project(&project).await.unwrap();
        store.mark_rendering(&project.id).await.unwrap();

        store
            .complete_render(
                &project.id,
                &CompletedRender {
                    video_url: "https://cdn/v.mp4".into(),
                    subtitle_url: None,
                    slides: project.slides.clone(),
                },
            )
            .await
            .unwrap();
        let done = store.get_project(&project.id).await.unwrap().unwrap();
        assert_eq!(done.status, ProjectStatus::Completed);
        assert_eq!(done.progress, Some(100));

        store.mark_rendering(&project.id).await.unwrap();
        store.fail_render(&project.id, "Publish failed").await.unwrap();
        let failed = store.get_status(&project.id).await.unwrap().unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("Publish failed"));
        assert!(failed.video_url.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_project() {
        let store = MemoryJobStore::new();
        assert!(matches!(
            store.mark_rendering(&ProjectId::new()).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
