//! Project and render job store.
//!
//! This crate provides:
//! - The [`JobStore`] trait used by the render worker and HTTP API
//! - An in-memory store for development and tests
//! - A PostgREST-backed store (Supabase or plain PostgREST)
//! - Retry with backoff and request metrics

pub mod error;
pub mod memory;
pub mod metrics;
pub mod rest;
pub mod retry;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryJobStore;
pub use rest::{RestJobStore, RestStoreConfig};
pub use retry::RetryConfig;
pub use store::{CompletedRender, JobStore};
