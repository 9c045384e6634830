//! Voice preview handler.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use slidecast_models::settings::{
    MAX_VOICE_PITCH, MAX_VOICE_SPEED, MIN_VOICE_PITCH, MIN_VOICE_SPEED,
};
use slidecast_models::VoiceType;
use slidecast_storage::CONTENT_TYPE_MP3;
use slidecast_tts::{NarrationVoice, VoiceSelection};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::middleware::{NARRATION_DURATION_HEADER, NARRATION_SOURCE_HEADER};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VoicePreviewRequest {
    pub text: String,
    #[serde(default)]
    pub voice: VoiceType,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub pitch: f32,
}

fn default_speed() -> f32 {
    1.0
}

/// POST /api/voice/preview
///
/// Narrate a short sample of `text`. A provider failure still answers 200
/// with an empty body and `x-narration-source: placeholder`.
///
/// Returns:
/// - 200: MP3 bytes (or empty for placeholder narration)
/// - 400: Empty text
/// - 422: Voice not available
pub async fn preview_voice(
    State(state): State<AppState>,
    Json(request): Json<VoicePreviewRequest>,
) -> ApiResult<Response> {
    if request.text.trim().is_empty() {
        return Err(ApiError::bad_request("Preview text is empty"));
    }

    let voice = NarrationVoice::try_from(request.voice)?;
    let selection = VoiceSelection {
        voice,
        speed: request.speed.clamp(MIN_VOICE_SPEED, MAX_VOICE_SPEED),
        pitch: request.pitch.clamp(MIN_VOICE_PITCH, MAX_VOICE_PITCH),
    };

    let narration = state.narration().preview(&request.text, &selection).await;
    let source = narration.source().as_str();
    metrics::record_voice_preview(source);
    debug!(source, duration = narration.duration_seconds, "Voice preview");

    let body = narration.bytes().map(|b| b.to_vec()).unwrap_or_default();
    let mut response = (StatusCode::OK, Body::from(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_MP3));
    headers.insert(NARRATION_SOURCE_HEADER, HeaderValue::from_static(source));
    headers.insert(
        NARRATION_DURATION_HEADER,
        HeaderValue::from(narration.duration_seconds),
    );

    Ok(response)
}
