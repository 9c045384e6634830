//! Speech synthesis error types.

use thiserror::Error;

pub type SpeechResult<T> = Result<T, SpeechError>;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech provider not configured (missing API key)")]
    NotConfigured,

    /// The requested voice cannot be served. Never silently substituted.
    #[error("Voice capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Speech provider returned {status}: {message}")]
    ProviderRejected { status: u16, message: String },

    #[error("Speech provider returned empty audio")]
    EmptyAudio,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpeechError {
    pub fn provider_rejected(status: u16, message: impl Into<String>) -> Self {
        Self::ProviderRejected {
            status,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            SpeechError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            SpeechError::ProviderRejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(SpeechError::provider_rejected(503, "busy").is_retryable());
        assert!(SpeechError::provider_rejected(429, "slow down").is_retryable());
        assert!(!SpeechError::provider_rejected(401, "bad key").is_retryable());
        assert!(!SpeechError::provider_rejected(400, "bad input").is_retryable());
        assert!(!SpeechError::NotConfigured.is_retryable());
        assert!(!SpeechError::CapabilityUnavailable("clone".into()).is_retryable());
    }
}
