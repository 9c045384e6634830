//! Output encoding settings.

/// Output frame width.
pub const VIDEO_WIDTH: u32 = 1920;
/// Output frame height.
pub const VIDEO_HEIGHT: u32 = 1080;

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default pixel format
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";
/// Default audio sample rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Video encoding configuration for assembled lectures.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingConfig {
    pub fps: u32,
    /// Constant Rate Factor (quality, 0-51, lower is better)
    pub crf: u8,
    /// Encoding preset (e.g., "veryfast", "medium")
    pub preset: String,
    pub audio_bitrate: String,
    /// Per-ffmpeg-invocation timeout
    pub timeout_secs: u64,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            crf: 23,
            preset: "veryfast".to_string(),
            audio_bitrate: "128k".to_string(),
            timeout_secs: 600,
        }
    }
}

impl EncodingConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            fps: std::env::var("VIDEO_FPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|fps: &u32| *fps > 0)
                .unwrap_or(defaults.fps),
            crf: std::env::var("VIDEO_CRF")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|crf: &u8| *crf <= 51)
                .unwrap_or(defaults.crf),
            preset: std::env::var("VIDEO_PRESET").unwrap_or(defaults.preset),
            audio_bitrate: std::env::var("VIDEO_AUDIO_BITRATE").unwrap_or(defaults.audio_bitrate),
            timeout_secs: std::env::var("VIDEO_ENCODE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}
