//! FFprobe-backed narration duration measurement.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use slidecast_media::probe_duration;
use slidecast_tts::DurationProbe;

/// Measures audio by writing it to a scratch file and running ffprobe.
#[derive(Debug, Clone)]
pub struct FfprobeDurationProbe {
    scratch_dir: PathBuf,
}

impl FfprobeDurationProbe {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }
}

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn duration_seconds(&self, audio: &[u8]) -> Option<f64> {
        if tokio::fs::create_dir_all(&self.scratch_dir).await.is_err() {
            return None;
        }
        let file = tempfile::Builder::new()
            .prefix("narration-")
            .suffix(".mp3")
            .tempfile_in(&self.scratch_dir)
            .ok()?;

        tokio::fs::write(file.path(), audio).await.ok()?;

        match probe_duration(file.path()).await {
            Ok(seconds) => Some(seconds),
            Err(e) => {
                debug!("ffprobe could not measure narration: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_garbage_audio_is_unmeasurable() {
        let dir = tempfile::tempdir().unwrap();
        let probe = FfprobeDurationProbe::new(dir.path());

        assert!(probe.duration_seconds(b"not audio").await.is_none());
    }
}
