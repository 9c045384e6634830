//! Worker error types.

use thiserror::Error;

use slidecast_media::MediaError;
use slidecast_models::SegmentError;
use slidecast_storage::StorageError;
use slidecast_store::StoreError;
use slidecast_tts::SpeechError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Script produced no slides")]
    SegmentationEmpty,

    #[error("Narration unavailable: {0}")]
    NarrationUnavailable(String),

    #[error("Nothing to assemble")]
    AssemblyEmptyTimeline,

    #[error("Video encoding failed: {0}")]
    AssemblyEncodeFailure(String),

    #[error("Publish failed: {0}")]
    PublishFailure(#[from] StorageError),

    #[error("Job store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Render task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn project_not_found(id: impl Into<String>) -> Self {
        Self::ProjectNotFound(id.into())
    }

    pub fn task_failed(msg: impl Into<String>) -> Self {
        Self::TaskFailed(msg.into())
    }

    /// One-line message stored on the failed record.
    ///
    /// Causes stay in the logs; the record carries what a user can act on.
    pub fn user_message(&self) -> String {
        match self {
            WorkerError::ProjectNotFound(_) => "Project no longer exists".to_string(),
            WorkerError::SegmentationEmpty => {
                "The script has no slides. Add content between '---' lines and try again".to_string()
            }
            WorkerError::NarrationUnavailable(msg) => format!("Narration unavailable: {}", msg),
            WorkerError::AssemblyEmptyTimeline => "There were no slides to put in the video".to_string(),
            WorkerError::AssemblyEncodeFailure(_) => "Video encoding failed".to_string(),
            WorkerError::PublishFailure(_) => "Could not publish the finished video".to_string(),
            WorkerError::StoreUnavailable(_) => "Project storage is unavailable".to_string(),
            WorkerError::TaskFailed(_) | WorkerError::Io(_) => "Render failed unexpectedly".to_string(),
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::ProjectNotFound(_) => "project_not_found",
            WorkerError::SegmentationEmpty => "segmentation_empty",
            WorkerError::NarrationUnavailable(_) => "narration_unavailable",
            WorkerError::AssemblyEmptyTimeline => "assembly_empty_timeline",
            WorkerError::AssemblyEncodeFailure(_) => "assembly_encode_failure",
            WorkerError::PublishFailure(_) => "publish_failure",
            WorkerError::StoreUnavailable(_) => "store_unavailable",
            WorkerError::TaskFailed(_) => "task_failed",
            WorkerError::Io(_) => "io",
        }
    }
}

impl From<SegmentError> for WorkerError {
    fn from(err: SegmentError) -> Self {
        match err {
            SegmentError::SegmentationEmpty => WorkerError::SegmentationEmpty,
        }
    }
}

impl From<MediaError> for WorkerError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::EmptyTimeline => WorkerError::AssemblyEmptyTimeline,
            other => WorkerError::AssemblyEncodeFailure(other.to_string()),
        }
    }
}

impl From<SpeechError> for WorkerError {
    fn from(err: SpeechError) -> Self {
        WorkerError::NarrationUnavailable(err.to_string())
    }
}
