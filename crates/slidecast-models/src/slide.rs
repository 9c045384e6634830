//! Slide definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Layout template for a slide.
///
/// Only informs image rendering; the pipeline never branches on it otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SlideTemplate {
    /// Body text, centered
    #[default]
    Text,
    /// Short headline-style slide
    TitleImage,
    /// Source code listing
    Code,
}

impl SlideTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlideTemplate::Text => "text",
            SlideTemplate::TitleImage => "title-image",
            SlideTemplate::Code => "code",
        }
    }
}

impl fmt::Display for SlideTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One timed unit of the output video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Slide {
    /// Stable unique identifier
    pub id: String,

    /// 1-based position within the project
    pub order: u32,

    /// Trimmed slide content
    pub text: String,

    /// Layout template
    #[serde(default)]
    pub template: SlideTemplate,

    /// Display duration in whole seconds
    pub duration_seconds: u32,

    /// Narration audio URL (set once narration has run)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,

    /// Rendered slide image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Slide {
    /// Create a slide with a fresh identifier and no generated assets.
    pub fn new(
        order: u32,
        text: impl Into<String>,
        template: SlideTemplate,
        duration_seconds: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            order,
            text: text.into(),
            template,
            duration_seconds,
            audio_url: None,
            image_url: None,
        }
    }

    /// True once both narration and image have produced an asset URL.
    pub fn has_assets(&self) -> bool {
        self.audio_url.is_some() && self.image_url.is_some()
    }
}
