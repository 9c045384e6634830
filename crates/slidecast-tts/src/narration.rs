//! Narration generation with placeholder fallback.
//!
//! A provider failure never aborts a render. It degrades that slide to
//! placeholder audio with an estimated duration, logs a warning and bumps
//! [`NARRATION_FALLBACKS_TOTAL`].

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tracing::{debug, warn};

use slidecast_models::estimate_duration_seconds;

use crate::client::SpeechProvider;
use crate::error::SpeechError;
use crate::types::{Narration, NarrationAudio, VoiceSelection};

/// Counter of slides narrated with placeholder audio after a provider failure.
pub const NARRATION_FALLBACKS_TOTAL: &str = "slidecast_narration_fallbacks_total";

/// Characters synthesized for a voice preview.
pub const PREVIEW_CHARS: usize = 100;

/// Measures the duration of encoded audio.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Duration in seconds, or `None` if it cannot be measured.
    async fn duration_seconds(&self, audio: &[u8]) -> Option<f64>;
}

/// Produces narration for slide text.
#[derive(Clone)]
pub struct NarrationGenerator {
    provider: Arc<dyn SpeechProvider>,
    probe: Option<Arc<dyn DurationProbe>>,
}

impl NarrationGenerator {
    pub fn new(provider: Arc<dyn SpeechProvider>) -> Self {
        Self {
            provider,
            probe: None,
        }
    }

    /// Measure synthesized audio with `probe` instead of estimating.
    pub fn with_probe(mut self, probe: Arc<dyn DurationProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Narrate `text`. Always returns audio or a placeholder.
    pub async fn synthesize(&self, text: &str, voice: &VoiceSelection) -> Narration {
        let text = text.trim();
        if text.is_empty() {
            debug!("Empty slide text; using placeholder narration");
            return placeholder(text);
        }

        match self.provider.synthesize(text, voice).await {
            Ok(bytes) => {
                let duration_seconds = self.measure(&bytes, text, voice.speed).await;
                Narration {
                    audio: NarrationAudio::Synthesized(bytes),
                    duration_seconds,
                }
            }
            Err(e) => {
                record_fallback(&e);
                placeholder(text)
            }
        }
    }

    /// Narrate only the first [`PREVIEW_CHARS`] characters of `text`.
    pub async fn preview(&self, text: &str, voice: &VoiceSelection) -> Narration {
        let head = preview_text(text);
        self.synthesize(&head, voice).await
    }

    async fn measure(&self, bytes: &[u8], text: &str, speed: f32) -> u32 {
        if let Some(probe) = &self.probe {
            if let Some(seconds) = probe.duration_seconds(bytes).await {
                if seconds.is_finite() && seconds > 0.0 {
                    return seconds.ceil() as u32;
                }
            }
            debug!("Audio duration probe unavailable; estimating from text");
        }
        scaled_estimate(text, speed)
    }
}

fn placeholder(text: &str) -> Narration {
    Narration {
        audio: NarrationAudio::Placeholder,
        duration_seconds: estimate_duration_seconds(text),
    }
}

fn record_fallback(error: &SpeechError) {
    let reason = match error {
        SpeechError::NotConfigured => "not_configured",
        SpeechError::ProviderRejected { status, .. } if *status == 401 || *status == 403 => "auth",
        SpeechError::ProviderRejected { status: 429, .. } => "quota",
        SpeechError::ProviderRejected { .. } => "rejected",
        SpeechError::Network(_) => "network",
        _ => "other",
    };
    warn!(reason, "Narration unavailable, using placeholder audio: {}", error);
    counter!(NARRATION_FALLBACKS_TOTAL, "reason" => reason).increment(1);
}

/// Estimate adjusted for speaking speed.
fn scaled_estimate(text: &str, speed: f32) -> u32 {
    let estimate = estimate_duration_seconds(text) as f32;
    let speed = if speed > 0.0 { speed } else { 1.0 };
    ((estimate / speed).ceil() as u32).max(1)
}

fn preview_text(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
