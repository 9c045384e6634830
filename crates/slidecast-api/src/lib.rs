//! Axum HTTP API server.
//!
//! This crate provides:
//! - Project creation, script segmentation and script updates
//! - Render start (idempotent per project) and status reads
//! - Voice previews
//! - Prometheus metrics
//! - An HTTP status source so the poller can run out of process

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use client::{HttpStatusSource, StatusClientConfig};
pub use config::{ApiConfig, PublishBackend, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
