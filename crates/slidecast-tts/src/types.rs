//! Narration request/response types.

use serde::{Deserialize, Serialize};

use slidecast_models::{ProjectSettings, VoiceType};

use crate::error::SpeechError;

/// Voices the speech provider can actually serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrationVoice {
    Female,
    Male,
}

impl NarrationVoice {
    /// Provider voice id.
    pub fn provider_voice(&self) -> &'static str {
        match self {
            NarrationVoice::Female => "nova",
            NarrationVoice::Male => "onyx",
        }
    }
}

impl TryFrom<VoiceType> for NarrationVoice {
    type Error = SpeechError;

    fn try_from(voice: VoiceType) -> Result<Self, Self::Error> {
        match voice {
            VoiceType::Female => Ok(NarrationVoice::Female),
            VoiceType::Male => Ok(NarrationVoice::Male),
            VoiceType::Clone => Err(SpeechError::CapabilityUnavailable(
                "voice cloning is not available".to_string(),
            )),
        }
    }
}

/// Voice, speed and pitch for one narration request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSelection {
    pub voice: NarrationVoice,
    /// Speed multiplier, 0.8..=1.5
    pub speed: f32,
    /// Pitch offset, -1..=1
    pub pitch: f32,
}

impl VoiceSelection {
    pub fn new(voice: NarrationVoice) -> Self {
        Self {
            voice,
            speed: 1.0,
            pitch: 0.0,
        }
    }
}

impl TryFrom<&ProjectSettings> for VoiceSelection {
    type Error = SpeechError;

    fn try_from(settings: &ProjectSettings) -> Result<Self, Self::Error> {
        Ok(Self {
            voice: NarrationVoice::try_from(settings.voice)?,
            speed: settings.clamped_speed(),
            pitch: settings.clamped_pitch(),
        })
    }
}

/// Body of the provider's speech endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SpeechRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
    pub voice: &'a str,
    pub speed: f32,
    pub response_format: &'a str,
}

/// Where a narration's audio came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrationSource {
    Synthesized,
    Placeholder,
}

impl NarrationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            NarrationSource::Synthesized => "synthesized",
            NarrationSource::Placeholder => "placeholder",
        }
    }
}

/// Narration audio payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NarrationAudio {
    /// MP3 bytes from the provider
    Synthesized(Vec<u8>),
    /// No audio; consumers substitute the placeholder URL or silence
    Placeholder,
}

/// Narration for one slide.
#[derive(Debug, Clone, PartialEq)]
pub struct Narration {
    pub audio: NarrationAudio,
    /// Authoritative spoken duration in whole seconds
    pub duration_seconds: u32,
}

impl Narration {
    pub fn source(&self) -> NarrationSource {
        match self.audio {
            NarrationAudio::Synthesized(_) => NarrationSource::Synthesized,
            NarrationAudio::Placeholder => NarrationSource::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.audio, NarrationAudio::Placeholder)
    }

    /// Audio bytes, if synthesized.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.audio {
            NarrationAudio::Synthesized(bytes) => Some(bytes),
            NarrationAudio::Placeholder => None,
        }
    }
}
