//! HTTP client for the render status endpoint.
//!
//! Lets the status poller run in a different process from the API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use slidecast_models::{ProjectId, RenderStatus};
use slidecast_worker::{PollError, StatusSource};

/// Configuration for the status client.
#[derive(Debug, Clone)]
pub struct StatusClientConfig {
    /// Base URL of the API server
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for StatusClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl StatusClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("SLIDECAST_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            timeout: Duration::from_secs(
                std::env::var("SLIDECAST_API_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }
}

/// Reads render status over `GET /api/projects/{id}/status`.
pub struct HttpStatusSource {
    http: Client,
    config: StatusClientConfig,
}

impl HttpStatusSource {
    pub fn new(config: StatusClientConfig) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> reqwest::Result<Self> {
        Self::new(StatusClientConfig::from_env())
    }

    fn status_url(&self, project_id: &ProjectId) -> String {
        format!(
            "{}/api/projects/{}/status",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(project_id.as_str())
        )
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch_status(&self, project_id: &ProjectId) -> Result<RenderStatus, PollError> {
        let url = self.status_url(project_id);
        debug!("Fetching render status from {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PollError::Transient(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(PollError::NotFound),
            status if status.is_success() => response
                .json::<RenderStatus>()
                .await
                .map_err(|e| PollError::Transient(format!("invalid status body: {}", e))),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(PollError::Transient(format!("status endpoint returned {}: {}", status, body)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidecast_models::JobStatus;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer) -> HttpStatusSource {
        HttpStatusSource::new(StatusClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_processing_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects/p1/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "processing",
                "progress": 42,
                "estimatedTimeRemaining": 30
            })))
            .mount(&server)
            .await;

        let status = source(&server)
            .fetch_status(&ProjectId::from_string("p1"))
            .await
            .unwrap();
        assert_eq!(status.status, JobStatus::Processing);
        assert_eq!(status.progress, 42);
        assert_eq!(status.estimated_time_remaining, Some(30));
    }

    #[tokio::test]
    async fn test_missing_project_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects/gone/status"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "detail": "Not found: project gone"
            })))
            .mount(&server)
            .await;

        let err = source(&server)
            .fetch_status(&ProjectId::from_string("gone"))
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::NotFound));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects/p1/status"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = source(&server)
            .fetch_status(&ProjectId::from_string("p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::Transient(_)));
    }
}
