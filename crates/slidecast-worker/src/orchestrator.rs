//! Render orchestrator.
//!
//! `start_render` moves a project into `rendering` and hands the work to a
//! spawned task. The caller only sees the handle; everything after that is
//! observable through the job store.
//!
//! A second request for a project that is already rendering is a no-op.
//! The guard checks an in-process registry first, then the stored status
//! (ignoring records that stopped reporting). The store check is
//! best-effort: two processes racing on one project can both proceed.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{info, Instrument};
use uuid::Uuid;

use slidecast_models::ProjectId;

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::pipeline::{execute_render, RenderContext};

/// Outcome of a `start_render` call.
#[derive(Debug)]
pub struct RenderHandle {
    pub project_id: ProjectId,
    /// False when a render was already active and this call did nothing
    pub accepted: bool,
    task: Option<JoinHandle<()>>,
}

impl RenderHandle {
    fn rejected(project_id: ProjectId) -> Self {
        Self {
            project_id,
            accepted: false,
            task: None,
        }
    }

    /// Wait for the spawned render to write its terminal state.
    pub async fn wait(self) -> WorkerResult<()> {
        match self.task {
            Some(task) => task.await.map_err(|e| WorkerError::task_failed(e.to_string())),
            None => Ok(()),
        }
    }
}

/// Starts renders and keeps at most one running per project in this process.
#[derive(Clone)]
pub struct RenderOrchestrator {
    ctx: Arc<RenderContext>,
    active: Arc<Mutex<HashSet<ProjectId>>>,
}

impl RenderOrchestrator {
    pub fn new(ctx: RenderContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    /// Whether this process is currently rendering `project_id`.
    pub fn is_active(&self, project_id: &ProjectId) -> bool {
        self.active
            .lock()
            .map(|set| set.contains(project_id))
            .unwrap_or(false)
    }

    /// Begin a render of `project_id`.
    ///
    /// Returns once the project is in `rendering` and the work is spawned, or
    /// immediately with `accepted: false` if a render is already active.
    pub async fn start_render(&self, project_id: &ProjectId) -> WorkerResult<RenderHandle> {
        let Some(slot) = ActiveSlot::acquire(&self.active, project_id) else {
            info!(project_id = %project_id, "Render already running in this process");
            metrics::record_render_deduplicated();
            return Ok(RenderHandle::rejected(project_id.clone()));
        };

        let project = self
            .ctx
            .store
            .get_project(project_id)
            .await?
            .ok_or_else(|| WorkerError::project_not_found(project_id.as_str()))?;

        if project.has_active_render(self.ctx.config.stale_after_secs()) {
            info!(project_id = %project_id, "Render already in progress");
            metrics::record_render_deduplicated();
            return Ok(RenderHandle::rejected(project_id.clone()));
        }

        self.ctx.store.mark_rendering(project_id).await?;
        metrics::record_render_started();

        let attempt = Uuid::new_v4().to_string();
        let logger = JobLogger::new(project_id, &attempt);
        let span = logger.create_span();
        let ctx = Arc::clone(&self.ctx);
        let id = project_id.clone();

        let task = tokio::spawn(
            async move {
                let _slot = slot;
                execute_render(ctx, id, logger).await;
            }
            .instrument(span),
        );

        Ok(RenderHandle {
            project_id: project_id.clone(),
            accepted: true,
            task: Some(task),
        })
    }
}

/// Registry entry for a render in this process, released on drop.
struct ActiveSlot {
    active: Arc<Mutex<HashSet<ProjectId>>>,
    project_id: ProjectId,
}

impl ActiveSlot {
    fn acquire(active: &Arc<Mutex<HashSet<ProjectId>>>, project_id: &ProjectId) -> Option<Self> {
        let mut set = active.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(project_id.clone()) {
            return None;
        }
        Some(Self {
            active: Arc::clone(active),
            project_id: project_id.clone(),
        })
    }
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        let mut set = self.active.lock().unwrap_or_else(|e| e.into_inner());
        set.remove(&self.project_id);
    }
}
