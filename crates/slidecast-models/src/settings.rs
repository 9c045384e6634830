//! Project-wide visual and voice settings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::slide::SlideTemplate;

/// Lowest accepted narration speed multiplier.
pub const MIN_VOICE_SPEED: f32 = 0.8;
/// Highest accepted narration speed multiplier.
pub const MAX_VOICE_SPEED: f32 = 1.5;
/// Lowest accepted pitch offset.
pub const MIN_VOICE_PITCH: f32 = -1.0;
/// Highest accepted pitch offset.
pub const MAX_VOICE_PITCH: f32 = 1.0;

/// Slide color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColorTheme {
    #[default]
    Blue,
    Green,
    Purple,
    Orange,
    Dark,
}

impl ColorTheme {
    /// Background color as RGB.
    pub fn background_rgb(&self) -> [u8; 3] {
        match self {
            ColorTheme::Blue => [0xEF, 0xF6, 0xFF],
            ColorTheme::Green => [0xEC, 0xFD, 0xF5],
            ColorTheme::Purple => [0xF5, 0xF3, 0xFF],
            ColorTheme::Orange => [0xFF, 0xF7, 0xED],
            ColorTheme::Dark => [0x11, 0x18, 0x27],
        }
    }

    /// Foreground (text) color as RGB.
    pub fn text_rgb(&self) -> [u8; 3] {
        match self {
            ColorTheme::Dark => [0xF9, 0xFA, 0xFB],
            _ => [0x11, 0x18, 0x27],
        }
    }

    /// Accent color used for the slide number marker.
    pub fn accent_rgb(&self) -> [u8; 3] {
        match self {
            ColorTheme::Blue => [0x25, 0x63, 0xEB],
            ColorTheme::Green => [0x05, 0x96, 0x69],
            ColorTheme::Purple => [0x7C, 0x3A, 0xED],
            ColorTheme::Orange => [0xEA, 0x58, 0x0C],
            ColorTheme::Dark => [0x9C, 0xA3, 0xAF],
        }
    }
}

/// Narration voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VoiceType {
    #[default]
    Female,
    Male,
    /// Gated voice cloning, not available yet
    Clone,
}

impl VoiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceType::Female => "female",
            VoiceType::Male => "male",
            VoiceType::Clone => "clone",
        }
    }
}

/// Settings shared by every slide of a project.
///
/// Read by narration (voice, speed, pitch) and image rendering (template,
/// theme, font). Neither mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct ProjectSettings {
    /// Template applied to newly added slides
    #[serde(default)]
    pub template: SlideTemplate,

    #[serde(default)]
    pub color_theme: ColorTheme,

    /// Font family name; resolved to a font file by the image renderer
    #[serde(default = "default_font")]
    #[validate(length(min = 1, max = 64))]
    pub font: String,

    #[serde(default)]
    pub voice: VoiceType,

    #[serde(default = "default_voice_speed")]
    #[validate(range(min = 0.8, max = 1.5))]
    pub voice_speed: f32,

    #[serde(default)]
    #[validate(range(min = -1.0, max = 1.0))]
    pub voice_pitch: f32,

    /// Optional background music reference (kept, not mixed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_music: Option<String>,

    #[serde(default = "default_true")]
    pub enable_subtitles: bool,
}

fn default_font() -> String {
    "pretendard".to_string()
}

fn default_voice_speed() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            template: SlideTemplate::default(),
            color_theme: ColorTheme::default(),
            font: default_font(),
            voice: VoiceType::default(),
            voice_speed: default_voice_speed(),
            voice_pitch: 0.0,
            background_music: None,
            enable_subtitles: true,
        }
    }
}

impl ProjectSettings {
    /// Voice speed clamped into the accepted range.
    pub fn clamped_speed(&self) -> f32 {
        self.voice_speed.clamp(MIN_VOICE_SPEED, MAX_VOICE_SPEED)
    }

    /// Voice pitch clamped into the accepted range.
    pub fn clamped_pitch(&self) -> f32 {
        self.voice_pitch.clamp(MIN_VOICE_PITCH, MAX_VOICE_PITCH)
    }
}
