//! Video assembly.
//!
//! Each timeline item becomes one self-contained H.264/AAC segment:
//! - the slide image looped for exactly `duration_seconds`
//! - the narration padded or trimmed to the same window, or a silent track
//!
//! Segments share one encoding profile, so the final file is a stream-copy
//! concat of them in `order`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, trace, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::encoding::{
    EncodingConfig, DEFAULT_AUDIO_CODEC, DEFAULT_PIXEL_FORMAT, DEFAULT_SAMPLE_RATE,
    DEFAULT_VIDEO_CODEC, VIDEO_HEIGHT, VIDEO_WIDTH,
};
use crate::error::{MediaError, MediaResult};

/// One slide's worth of timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineItem {
    pub order: u32,
    /// Rendered slide image
    pub image: PathBuf,
    /// Narration audio; `None` gets a silent track
    pub audio: Option<PathBuf>,
    pub duration_seconds: u32,
}

/// Result of a successful assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledVideo {
    pub path: PathBuf,
    /// Sum of item durations
    pub duration_seconds: u32,
    pub segment_count: usize,
}

/// Turns a timeline into one video file.
#[async_trait]
pub trait VideoAssembler: Send + Sync {
    /// Assemble `items` (in `order`) into `output`.
    ///
    /// An empty timeline is rejected with [`MediaError::EmptyTimeline`].
    async fn assemble(&self, items: &[TimelineItem], output: &Path) -> MediaResult<AssembledVideo>;
}

/// FFmpeg CLI assembler.
#[derive(Debug, Clone, Default)]
pub struct FfmpegAssembler {
    encoding: EncodingConfig,
}

impl FfmpegAssembler {
    pub fn new(encoding: EncodingConfig) -> Self {
        Self { encoding }
    }

    fn runner(&self) -> FfmpegRunner {
        FfmpegRunner::new().with_timeout(self.encoding.timeout_secs)
    }

    /// Command that encodes a single item into a standalone segment.
    pub fn segment_command(&self, item: &TimelineItem, segment_path: &Path) -> FfmpegCommand {
        let enc = &self.encoding;
        let duration = f64::from(item.duration_seconds.max(1));
        let window = format!("{:.3}", duration);

        let cmd = FfmpegCommand::new(segment_path).input_with(
            [
                "-loop".to_string(),
                "1".to_string(),
                "-framerate".to_string(),
                enc.fps.to_string(),
                "-t".to_string(),
                window.clone(),
            ],
            item.image.to_string_lossy(),
        );

        let cmd = match &item.audio {
            Some(audio) => cmd.input(audio),
            None => cmd.input_with(
                ["-f".to_string(), "lavfi".to_string(), "-t".to_string(), window],
                format!("anullsrc=r={}:cl=stereo", DEFAULT_SAMPLE_RATE),
            ),
        };

        cmd.map("0:v:0")
            .map("1:a:0")
            .video_filter(format!(
                "scale={w}:{h}:force_original_aspect_ratio=decrease,\
                 pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1",
                w = VIDEO_WIDTH,
                h = VIDEO_HEIGHT
            ))
            .audio_filter("apad")
            .video_codec(DEFAULT_VIDEO_CODEC)
            .preset(enc.preset.clone())
            .crf(enc.crf)
            .pixel_format(DEFAULT_PIXEL_FORMAT)
            .frame_rate(enc.fps)
            .audio_codec(DEFAULT_AUDIO_CODEC)
            .output_args([
                "-b:a".to_string(),
                enc.audio_bitrate.clone(),
                "-ar".to_string(),
                DEFAULT_SAMPLE_RATE.to_string(),
                "-ac".to_string(),
                "2".to_string(),
            ])
            .duration(duration)
    }

    /// Command that stream-copies the listed segments into `output`.
    pub fn concat_command(list_path: &Path, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(output)
            .input_with(["-f", "concat", "-safe", "0"], list_path.to_string_lossy())
            .codec_copy()
            .output_args(["-movflags", "+faststart"])
    }
}

#[async_trait]
impl VideoAssembler for FfmpegAssembler {
    async fn assemble(&self, items: &[TimelineItem], output: &Path) -> MediaResult<AssembledVideo> {
        if items.is_empty() {
            return Err(MediaError::EmptyTimeline);
        }

        let mut ordered: Vec<&TimelineItem> = items.iter().collect();
        ordered.sort_by_key(|item| item.order);

        let segments_dir = segments_dir_for(output);
        fs::create_dir_all(&segments_dir).await?;

        info!(
            segments = ordered.len(),
            output = %output.display(),
            "Assembling video"
        );

        let result = self.encode_and_concat(&ordered, &segments_dir, output).await;

        if let Err(e) = fs::remove_dir_all(&segments_dir).await {
            warn!(dir = %segments_dir.display(), "Failed to clean segment dir: {}", e);
        }

        result?;

        Ok(AssembledVideo {
            path: output.to_path_buf(),
            duration_seconds: ordered.iter().map(|item| item.duration_seconds.max(1)).sum(),
            segment_count: ordered.len(),
        })
    }
}

impl FfmpegAssembler {
    async fn encode_and_concat(
        &self,
        ordered: &[&TimelineItem],
        segments_dir: &Path,
        output: &Path,
    ) -> MediaResult<()> {
        let runner = self.runner();
        let mut segment_paths = Vec::with_capacity(ordered.len());

        for (index, item) in ordered.iter().enumerate() {
            let segment_path = segments_dir.join(format!("segment_{:04}.mp4", index + 1));
            let cmd = self.segment_command(item, &segment_path);
            let total = f64::from(item.duration_seconds.max(1));
            let order = item.order;
            runner
                .run_with_progress(&cmd, move |progress| {
                    trace!(
                        order,
                        percent = (progress.fraction_of(total) * 100.0).round(),
                        speed = progress.speed,
                        "Segment encode progress"
                    );
                })
                .await?;
            debug!(order = item.order, path = %segment_path.display(), "Encoded segment");
            segment_paths.push(segment_path);
        }

        let list_path = segments_dir.join("concat.txt");
        fs::write(&list_path, concat_list(&segment_paths)).await?;

        runner
            .run(&Self::concat_command(&list_path, output))
            .await
    }
}

/// Concat demuxer list for `paths`, one `file '...'` line each.
pub fn concat_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| {
            let escaped = path.to_string_lossy().replace('\'', "'\\''");
            format!("file '{}'\n", escaped)
        })
        .collect()
}

fn segments_dir_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}_segments", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(order: u32, audio: Option<&str>, duration: u32) -> TimelineItem {
        TimelineItem {
            order,
            image: PathBuf::from(format!("/work/{}.png", order)),
            audio: audio.map(PathBuf::from),
            duration_seconds: duration,
        }
    }

    fn inputs(cmd: &FfmpegCommand) -> Vec<String> {
        let args = cmd.build_args();
        args.iter()
            .zip(args.iter().skip(1))
            .filter(|(flag, _)| *flag == "-i")
            .map(|(_, value)| value.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_empty_timeline_rejected() {
        let assembler = FfmpegAssembler::default();
        let result = assembler.assemble(&[], Path::new("/tmp/never.mp4")).await;
        assert!(matches!(result, Err(MediaError::EmptyTimeline)));
    }

    #[test]
    fn test_segment_with_audio() {
        let assembler = FfmpegAssembler::default();
        let cmd = assembler.segment_command(&item(1, Some("/work/1.mp3"), 4), Path::new("/work/s1.mp4"));

        assert_eq!(inputs(&cmd), vec!["/work/1.png", "/work/1.mp3"]);
        let args = cmd.build_args();
        assert!(args.contains(&"apad".to_string()));
        assert!(args.contains(&"yuv420p".to_string()));
        // Output window equals the slide duration
        let t_positions: Vec<usize> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| *a == "-t")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(args[*t_positions.last().unwrap() + 1], "4.000");
    }

    #[test]
    fn test_segment_without_audio_uses_silence() {
        let assembler = FfmpegAssembler::default();
        let cmd = assembler.segment_command(&item(2, None, 5), Path::new("/work/s2.mp4"));

        let sources = inputs(&cmd);
        assert_eq!(sources.len(), 2);
        assert!(sources[1].starts_with("anullsrc"));
        assert!(cmd.build_args().contains(&"lavfi".to_string()));
    }

    #[test]
    fn test_concat_list_escapes_quotes() {
        let list = concat_list(&[
            PathBuf::from("/work/segment_0001.mp4"),
            PathBuf::from("/work/it's.mp4"),
        ]);
        assert_eq!(
            list,
            "file '/work/segment_0001.mp4'\nfile '/work/it'\\''s.mp4'\n"
        );
    }

    #[test]
    fn test_concat_is_stream_copy() {
        let cmd = FfmpegAssembler::concat_command(Path::new("/w/list.txt"), Path::new("/w/out.mp4"));
        let args = cmd.build_args();
        assert!(args.contains(&"concat".to_string()));
        assert!(args.contains(&"copy".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/w/out.mp4"));
    }

    #[test]
    fn test_segments_dir_next_to_output() {
        assert_eq!(
            segments_dir_for(Path::new("/work/p1/video.mp4")),
            PathBuf::from("/work/p1/video_segments")
        );
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_single_silent_item_produces_five_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("slide.png");
        image::RgbaImage::from_pixel(VIDEO_WIDTH, VIDEO_HEIGHT, image::Rgba([255, 255, 255, 255]))
            .save(&image_path)
            .unwrap();

        let items = vec![TimelineItem {
            order: 1,
            image: image_path,
            audio: None,
            duration_seconds: 5,
        }];
        let output = dir.path().join("video.mp4");
        let video = FfmpegAssembler::default().assemble(&items, &output).await.unwrap();

        assert_eq!(video.duration_seconds, 5);
        assert_eq!(video.segment_count, 1);
        let probed = crate::probe::probe_duration(&output).await.unwrap();
        assert!((probed - 5.0).abs() < 0.2, "duration was {}", probed);
    }
}
