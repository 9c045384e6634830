//! Publishing seam and object key layout.
//!
//! Every published object lives under `projects/{project_id}/`:
//! - `video.mp4`
//! - `subtitles.srt`
//! - `slides/{order}.png` and `slides/{order}.mp3`

use async_trait::async_trait;
use std::path::Path;

use crate::error::{StorageError, StorageResult};

pub const CONTENT_TYPE_MP4: &str = "video/mp4";
pub const CONTENT_TYPE_PNG: &str = "image/png";
pub const CONTENT_TYPE_MP3: &str = "audio/mpeg";
pub const CONTENT_TYPE_SRT: &str = "application/x-subrip";

/// Publishes files under a key and returns their public URL.
///
/// Publishing an existing key replaces it.
#[async_trait]
pub trait AssetPublisher: Send + Sync {
    async fn publish_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<String>;

    async fn publish_bytes(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<String>;

    /// Whether the backing store is reachable.
    async fn check_ready(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Key of the final lecture video.
pub fn video_key(project_id: &str) -> String {
    format!("projects/{}/video.mp4", project_id)
}

/// Key of the subtitle track.
pub fn subtitles_key(project_id: &str) -> String {
    format!("projects/{}/subtitles.srt", project_id)
}

/// Key of a rendered slide image.
pub fn slide_image_key(project_id: &str, order: u32) -> String {
    format!("projects/{}/slides/{}.png", project_id, order)
}

/// Key of a slide's narration audio.
pub fn slide_audio_key(project_id: &str, order: u32) -> String {
    format!("projects/{}/slides/{}.mp3", project_id, order)
}

/// Reject keys that could escape their prefix.
pub fn validate_key(key: &str) -> StorageResult<()> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// `base` and `key` joined with exactly one slash.
pub fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(video_key("p1"), "projects/p1/video.mp4");
        assert_eq!(subtitles_key("p1"), "projects/p1/subtitles.srt");
        assert_eq!(slide_image_key("p1", 3), "projects/p1/slides/3.png");
        assert_eq!(slide_audio_key("p1", 3), "projects/p1/slides/3.mp3");
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("projects/p1/video.mp4").is_ok());
        assert!(validate_key("projects/../etc/passwd").is_err());
        assert!(validate_key("/abs/key").is_err());
        assert!(validate_key("a//b").is_err());
        assert!(validate_key("").is_err());
    }

    #[test]
    fn test_public_url_joins_once() {
        assert_eq!(public_url("https://cdn.example/", "a/b.mp4"), "https://cdn.example/a/b.mp4");
        assert_eq!(public_url("https://cdn.example", "a/b.mp4"), "https://cdn.example/a/b.mp4");
    }
}
