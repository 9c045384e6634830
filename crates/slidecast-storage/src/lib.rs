//! Asset publishing.
//!
//! This crate provides:
//! - The [`AssetPublisher`] seam used by the render pipeline
//! - Cloudflare R2 publishing with public URLs
//! - A local-directory publisher for development
//! - The `projects/{id}/...` object key layout

pub mod client;
pub mod error;
pub mod local;
pub mod publisher;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use local::LocalPublisher;
pub use publisher::{
    slide_audio_key, slide_image_key, subtitles_key, video_key, AssetPublisher, CONTENT_TYPE_MP3,
    CONTENT_TYPE_MP4, CONTENT_TYPE_PNG, CONTENT_TYPE_SRT,
};
