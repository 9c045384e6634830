//! FFmpeg `-progress` output parsing.

use serde::{Deserialize, Serialize};

/// Progress snapshot reported by FFmpeg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Feed one `key=value` line. Returns a snapshot at each block boundary.
    pub fn apply_line(&mut self, line: &str) -> Option<FfmpegProgress> {
        let (key, value) = line.trim().split_once('=')?;

        match key {
            // Both keys carry microseconds despite the name
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.out_time_ms = us / 1000;
                }
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    self.frame = frame;
                }
            }
            "speed" => {
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    self.speed = speed;
                }
            }
            "progress" => {
                self.is_complete = value == "end";
                return Some(self.clone());
            }
            _ => {}
        }

        None
    }

    /// Fraction of `total_seconds` encoded so far, in 0.0..=1.0.
    pub fn fraction_of(&self, total_seconds: f64) -> f64 {
        if self.is_complete {
            return 1.0;
        }
        if total_seconds <= 0.0 {
            return 0.0;
        }
        (self.out_time_ms as f64 / 1000.0 / total_seconds).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_parsing() {
        let mut progress = FfmpegProgress::default();

        assert!(progress.apply_line("frame=150").is_none());
        assert!(progress.apply_line("out_time_us=5000000").is_none());
        assert!(progress.apply_line("speed=2.5x").is_none());

        let snapshot = progress.apply_line("progress=continue").unwrap();
        assert_eq!(snapshot.frame, 150);
        assert_eq!(snapshot.out_time_ms, 5000);
        assert!((snapshot.speed - 2.5).abs() < 0.01);
        assert!(!snapshot.is_complete);

        let done = progress.apply_line("progress=end").unwrap();
        assert!(done.is_complete);
    }

    #[test]
    fn test_unparseable_values_are_ignored() {
        let mut progress = FfmpegProgress::default();
        progress.apply_line("speed=N/A");
        progress.apply_line("out_time_us=N/A");
        progress.apply_line("garbage");

        assert_eq!(progress.speed, 0.0);
        assert_eq!(progress.out_time_ms, 0);
    }

    #[test]
    fn test_fraction() {
        let progress = FfmpegProgress {
            out_time_ms: 2500,
            ..Default::default()
        };
        assert!((progress.fraction_of(10.0) - 0.25).abs() < 1e-9);
        assert_eq!(progress.fraction_of(0.0), 0.0);
        assert!((progress.fraction_of(1.0) - 1.0).abs() < 1e-9);
    }
}
