//! Render worker.
//!
//! This crate provides:
//! - The render orchestrator with its idempotent `start_render` entry point
//! - The per-render pipeline: narration and slide images per slide,
//!   assembly, publishing and terminal status writes
//! - Monotonic progress reporting
//! - A cancellable status poller
//! - An ffprobe-backed narration duration probe

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod pipeline;
pub mod poller;
pub mod probe;
pub mod progress;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
pub use orchestrator::{RenderHandle, RenderOrchestrator};
pub use pipeline::RenderContext;
pub use poller::{spawn_poller, PollError, PollHandle, StatusSource, StoreStatusSource};
pub use probe::FfprobeDurationProbe;
