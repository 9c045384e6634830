//! Speech provider HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{SpeechError, SpeechResult};
use crate::types::{SpeechRequest, VoiceSelection};

/// Configuration for the speech client.
#[derive(Debug, Clone)]
pub struct SpeechClientConfig {
    /// Base URL of the OpenAI-compatible speech API
    pub base_url: String,
    /// Bearer token; without it every request fails as not configured
    pub api_key: Option<String>,
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
    /// First retry delay, doubled per attempt
    pub retry_base_delay: Duration,
}

impl Default for SpeechClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            model: "tts-1".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl SpeechClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("TTS_BASE_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("TTS_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            model: std::env::var("TTS_MODEL").unwrap_or(defaults.model),
            timeout: Duration::from_secs(
                std::env::var("TTS_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: std::env::var("TTS_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            retry_base_delay: defaults.retry_base_delay,
        }
    }
}

/// Text-to-speech provider.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize `text`, returning MP3 bytes.
    async fn synthesize(&self, text: &str, voice: &VoiceSelection) -> SpeechResult<Vec<u8>>;
}

/// Client for an OpenAI-compatible `/v1/audio/speech` endpoint.
///
/// Holds one pooled HTTP client; build it once and share it.
pub struct OpenAiSpeechClient {
    http: Client,
    config: SpeechClientConfig,
}

impl OpenAiSpeechClient {
    /// Create a new speech client.
    pub fn new(config: SpeechClientConfig) -> SpeechResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(SpeechError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> SpeechResult<Self> {
        Self::new(SpeechClientConfig::from_env())
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn request_once(&self, url: &str, api_key: &str, body: &SpeechRequest<'_>) -> SpeechResult<Vec<u8>> {
        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SpeechError::provider_rejected(status.as_u16(), message));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        Ok(bytes.to_vec())
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> SpeechResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = SpeechResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_base_delay * 2u32.pow(attempt);
                    warn!(
                        "Speech request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl SpeechProvider for OpenAiSpeechClient {
    async fn synthesize(&self, text: &str, voice: &VoiceSelection) -> SpeechResult<Vec<u8>> {
        let api_key = self.config.api_key.as_deref().ok_or(SpeechError::NotConfigured)?;
        let url = format!("{}/v1/audio/speech", self.config.base_url.trim_end_matches('/'));

        let body = SpeechRequest {
            model: &self.config.model,
            input: text,
            voice: voice.voice.provider_voice(),
            speed: voice.speed,
            response_format: "mp3",
        };

        if voice.pitch.abs() > f32::EPSILON {
            debug!(pitch = voice.pitch, "Provider has no pitch control; ignoring pitch");
        }
        debug!(chars = text.chars().count(), voice = body.voice, "Requesting speech synthesis");

        self.with_retry(|| self.request_once(&url, api_key, &body)).await
    }
}
