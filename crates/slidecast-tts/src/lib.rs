//! Narration for slides.
//!
//! This crate provides an explicitly constructed client for an
//! OpenAI-compatible speech endpoint, and a [`NarrationGenerator`] that turns
//! provider failures into placeholder narration so a render always proceeds.

pub mod client;
pub mod error;
pub mod narration;
pub mod types;

pub use client::{OpenAiSpeechClient, SpeechClientConfig, SpeechProvider};
pub use error::{SpeechError, SpeechResult};
pub use narration::{DurationProbe, NarrationGenerator, NARRATION_FALLBACKS_TOTAL, PREVIEW_CHARS};
pub use types::{Narration, NarrationAudio, NarrationSource, NarrationVoice, VoiceSelection};
