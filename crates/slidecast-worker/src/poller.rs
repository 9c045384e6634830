//! Render status polling.
//!
//! A poll loop reads a [`StatusSource`] at a fixed interval and publishes
//! each snapshot on a watch channel until a terminal status arrives.
//!
//! - Read errors are transient: logged, then retried on the next tick
//! - Reported progress never moves backwards, even if reads race
//! - Dropping the [`PollHandle`] stops the loop

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use slidecast_models::{ProjectId, RenderStatus};
use slidecast_store::JobStore;

/// Default interval between status reads.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum PollError {
    #[error("Project not found")]
    NotFound,

    #[error("Status read failed: {0}")]
    Transient(String),
}

/// Something that can report a render's status.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, project_id: &ProjectId) -> Result<RenderStatus, PollError>;
}

/// Reads status straight from a job store.
pub struct StoreStatusSource {
    store: Arc<dyn JobStore>,
}

impl StoreStatusSource {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StatusSource for StoreStatusSource {
    async fn fetch_status(&self, project_id: &ProjectId) -> Result<RenderStatus, PollError> {
        match self.store.get_status(project_id).await {
            Ok(Some(status)) => Ok(status),
            Ok(None) => Err(PollError::NotFound),
            Err(e) => Err(PollError::Transient(e.to_string())),
        }
    }
}

/// Running poll loop. Dropping it cancels the loop.
#[derive(Debug)]
pub struct PollHandle {
    updates: watch::Receiver<Option<RenderStatus>>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Latest snapshot, if any has been read.
    pub fn latest(&self) -> Option<RenderStatus> {
        self.updates.borrow().clone()
    }

    /// Wait for the next snapshot. `None` once the loop has stopped.
    pub async fn next(&mut self) -> Option<RenderStatus> {
        self.updates.changed().await.ok()?;
        self.updates.borrow_and_update().clone()
    }

    /// Wait for the loop to stop and return the last snapshot.
    ///
    /// The loop stops on a terminal status or when the project disappears.
    pub async fn finished(mut self) -> Option<RenderStatus> {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.latest()
    }

    /// Stop polling now.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Start polling `project_id` every `interval`.
pub fn spawn_poller(source: Arc<dyn StatusSource>, project_id: ProjectId, interval: Duration) -> PollHandle {
    let (tx, rx) = watch::channel(None);
    let task = tokio::spawn(poll_loop(source, project_id, interval, tx));

    PollHandle {
        updates: rx,
        task: Some(task),
    }
}

async fn poll_loop(
    source: Arc<dyn StatusSource>,
    project_id: ProjectId,
    interval: Duration,
    tx: watch::Sender<Option<RenderStatus>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut highest = 0u8;

    loop {
        ticker.tick().await;

        match source.fetch_status(&project_id).await {
            Ok(mut status) => {
                // Out-of-order reads must not move the bar backwards
                highest = highest.max(status.progress);
                status.progress = highest;

                let terminal = status.is_terminal();
                debug!(project_id = %project_id, status = status.status.as_str(), progress = status.progress, "Polled render status");
                if tx.send(Some(status)).is_err() {
                    return;
                }
                if terminal {
                    return;
                }
            }
            Err(PollError::NotFound) => {
                warn!(project_id = %project_id, "Project disappeared; stopping poller");
                return;
            }
            Err(e) => {
                warn!(project_id = %project_id, "Status poll failed, will retry: {}", e);
            }
        }
    }
}
