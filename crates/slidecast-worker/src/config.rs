//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Placeholder narration reference stored as `audio_url` on fallback.
pub const DEFAULT_PLACEHOLDER_AUDIO_URL: &str = "data:audio/mp3;base64,mock";

/// Render worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Work directory for per-render temporary files
    pub work_dir: PathBuf,
    /// Maximum slides narrated and rendered concurrently within one render
    pub max_slide_parallel: usize,
    /// A `rendering` record idle longer than this is treated as abandoned
    pub render_stale_after: Duration,
    /// `audio_url` recorded for slides narrated with placeholder audio
    pub placeholder_audio_url: String,
    /// Font used by the slide image renderer
    pub slide_font_path: Option<PathBuf>,
    /// Directory of `<family>.ttf` files selectable per project
    pub slide_font_dir: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/slidecast"),
            max_slide_parallel: 4,
            render_stale_after: Duration::from_secs(600),
            placeholder_audio_url: DEFAULT_PLACEHOLDER_AUDIO_URL.to_string(),
            slide_font_path: None,
            slide_font_dir: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            max_slide_parallel: std::env::var("WORKER_MAX_SLIDE_PARALLEL")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_slide_parallel),
            render_stale_after: Duration::from_secs(
                std::env::var("WORKER_RENDER_STALE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            placeholder_audio_url: std::env::var("PLACEHOLDER_AUDIO_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.placeholder_audio_url),
            slide_font_path: std::env::var("SLIDE_FONT_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            slide_font_dir: std::env::var("SLIDE_FONT_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }

    /// How often a running render refreshes its store row.
    ///
    /// A third of the staleness threshold, so two missed beats still
    /// leave the render active.
    pub fn heartbeat_interval(&self) -> Duration {
        (self.render_stale_after / 3).max(Duration::from_millis(100))
    }

    /// Staleness threshold in whole seconds.
    pub fn stale_after_secs(&self) -> i64 {
        self.render_stale_after.as_secs() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_defaults() {
        std::env::remove_var("WORKER_WORK_DIR");
        std::env::remove_var("WORKER_MAX_SLIDE_PARALLEL");
        std::env::remove_var("PLACEHOLDER_AUDIO_URL");

        let config = WorkerConfig::from_env();
        assert_eq!(config.work_dir, PathBuf::from("/tmp/slidecast"));
        assert_eq!(config.max_slide_parallel, 4);
        assert_eq!(config.placeholder_audio_url, DEFAULT_PLACEHOLDER_AUDIO_URL);
        assert_eq!(config.stale_after_secs(), 600);
    }

    #[test]
    fn test_heartbeat_beats_inside_stale_window() {
        let config = WorkerConfig {
            render_stale_after: Duration::from_secs(600),
            ..WorkerConfig::default()
        };
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(200));

        let tiny = WorkerConfig {
            render_stale_after: Duration::from_millis(30),
            ..WorkerConfig::default()
        };
        assert_eq!(tiny.heartbeat_interval(), Duration::from_millis(100));
    }

    #[test]
    #[serial]
    fn test_zero_parallelism_ignored() {
        std::env::set_var("WORKER_MAX_SLIDE_PARALLEL", "0");
        assert_eq!(WorkerConfig::from_env().max_slide_parallel, 4);
        std::env::remove_var("WORKER_MAX_SLIDE_PARALLEL");
    }
}
