//! Slide rendering and video assembly.
//!
//! This crate provides:
//! - Slide image rendering to 1920x1080 PNG (fontdue + image)
//! - Type-safe FFmpeg command building with multiple inputs
//! - Progress parsing from `-progress pipe:1`
//! - Encoder deadlines via tokio
//! - Timeline assembly into one H.264/AAC MP4
//! - FFprobe duration probing

pub mod assemble;
pub mod command;
pub mod encoding;
pub mod error;
pub mod probe;
pub mod progress;
pub mod slide_image;

pub use assemble::{concat_list, AssembledVideo, FfmpegAssembler, TimelineItem, VideoAssembler};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use encoding::{EncodingConfig, VIDEO_HEIGHT, VIDEO_WIDTH};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_duration, probe_media, MediaInfo};
pub use progress::FfmpegProgress;
pub use slide_image::{PlacedLine, SlideImageRenderer, SlideRenderer};
