//! PostgREST job store.
//!
//! Projects are rows in a single table, keyed by `id`, with `slides` and
//! `settings` held as JSON columns. Works against Supabase or a bare
//! PostgREST in front of Postgres.
//!
//! - Filtered PATCH for monotonic progress
//! - Exponential backoff on 429/5xx and network errors
//! - Request metrics and tracing spans per operation

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info_span, Instrument};

use slidecast_models::editor::total_duration;
use slidecast_models::{Project, ProjectId, ProjectStatus, Slide};

use crate::error::{StoreError, StoreResult};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};
use crate::store::{CompletedRender, JobStore};

/// REST store configuration.
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Base URL, e.g. `https://xyz.supabase.co`
    pub base_url: String,
    /// Service key sent as `apikey` and bearer token
    pub api_key: String,
    pub table: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryConfig,
}

impl RestStoreConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            table: "projects".to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let base_url = std::env::var("JOB_STORE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StoreError::Config("JOB_STORE_URL must be set".to_string()))?;
        let api_key = std::env::var("JOB_STORE_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StoreError::Config("JOB_STORE_KEY must be set".to_string()))?;

        let mut config = Self::new(base_url, api_key);
        if let Ok(table) = std::env::var("JOB_STORE_TABLE") {
            if !table.is_empty() {
                config.table = table;
            }
        }
        config.timeout = Duration::from_secs(
            std::env::var("JOB_STORE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        );
        config.retry = RetryConfig::from_env();
        Ok(config)
    }
}

/// Job store over the PostgREST HTTP interface.
#[derive(Clone)]
pub struct RestJobStore {
    http: Client,
    config: RestStoreConfig,
}

impl RestJobStore {
    pub fn new(config: RestStoreConfig) -> StoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("slidecast-store/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StoreError::Network)?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> StoreResult<Self> {
        Self::new(RestStoreConfig::from_env()?)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.base_url, self.config.table)
    }

    fn row_url(&self, id: &ProjectId) -> String {
        format!("{}?id=eq.{}", self.table_url(), urlencoding::encode(id.as_str()))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    // =========================================================================
    // Single attempts
    // =========================================================================

    async fn insert_once(&self, project: &Project) -> StoreResult<()> {
        let url = self.table_url();
        let response = self
            .request(Method::POST, &url)
            .header("Prefer", "return=minimal")
            .json(project)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(()),
            StatusCode::CONFLICT => Err(StoreError::AlreadyExists(project.id.to_string())),
            status => Err(Self::handle_error_response(status, &url, response).await),
        }
    }

    async fn select_once(&self, id: &ProjectId) -> StoreResult<Option<Project>> {
        let url = format!("{}&select=*", self.row_url(id));
        let response = self
            .request(Method::GET, &url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let rows: Vec<Project> = response.json().await?;
                Ok(rows.into_iter().next())
            }
            status => Err(Self::handle_error_response(status, &url, response).await),
        }
    }

    /// PATCH matching rows and return how many were updated.
    async fn patch_once(&self, url: &str, body: &Value) -> StoreResult<usize> {
        let response = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let rows: Vec<Value> = response.json().await?;
                Ok(rows.len())
            }
            StatusCode::NO_CONTENT => Ok(0),
            status => Err(Self::handle_error_response(status, url, response).await),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// PATCH a single project row, failing if it does not exist.
    async fn patch_project(&self, operation: &str, id: &ProjectId, body: Value) -> StoreResult<()> {
        let url = self.row_url(id);
        let updated = self
            .execute_request(
                operation,
                id,
                with_retry(&self.config.retry, operation, || self.patch_once(&url, &body)),
            )
            .await?;

        if updated == 0 {
            return Err(StoreError::not_found(id.as_str()));
        }
        Ok(())
    }

    async fn execute_request<T, F>(&self, operation: &str, id: &ProjectId, fut: F) -> StoreResult<T>
    where
        F: std::future::Future<Output = StoreResult<T>>,
    {
        let span = info_span!(
            "store_request",
            operation = %operation,
            table = %self.config.table,
            project_id = %id
        );

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency = start.elapsed().as_secs_f64();

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency);

        result
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: Response) -> StoreError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(|secs| secs * 1000);
            return StoreError::RateLimited { retry_after_ms };
        }

        let body = response.text().await.unwrap_or_default();
        StoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

#[async_trait]
impl JobStore for RestJobStore {
    async fn create_project(&self, project: &Project) -> StoreResult<()> {
        self.execute_request(
            "create_project",
            &project.id,
            with_retry(&self.config.retry, "create_project", || self.insert_once(project)),
        )
        .await
    }

    async fn get_project(&self, id: &ProjectId) -> StoreResult<Option<Project>> {
        self.execute_request(
            "get_project",
            id,
            with_retry(&self.config.retry, "get_project", || self.select_once(id)),
        )
        .await
    }

    async fn replace_slides(&self, id: &ProjectId, script: Option<&str>, slides: &[Slide]) -> StoreResult<()> {
        let mut body = json!({
            "slides": slides,
            "duration_seconds": total_duration(slides),
            "updated_at": Utc::now(),
        });
        if let Some(script) = script {
            body["script"] = json!(script);
        }
        self.patch_project("replace_slides", id, body).await
    }

    async fn mark_rendering(&self, id: &ProjectId) -> StoreResult<()> {
        let now = Utc::now();
        let body = json!({
            "status": ProjectStatus::Rendering,
            "progress": 0,
            "error_message": null,
            "video_url": null,
            "subtitle_url": null,
            "render_started_at": now,
            "updated_at": now,
        });
        self.patch_project("mark_rendering", id, body).await
    }

    async fn update_progress(&self, id: &ProjectId, progress: u8) -> StoreResult<()> {
        let progress = progress.min(100);
        // Only rows still rendering and below the new value are touched
        let url = format!(
            "{}&status=eq.rendering&or=(progress.is.null,progress.lt.{})",
            self.row_url(id),
            progress
        );
        let body = json!({ "progress": progress, "updated_at": Utc::now() });

        let updated = self
            .execute_request(
                "update_progress",
                id,
                with_retry(&self.config.retry, "update_progress", || self.patch_once(&url, &body)),
            )
            .await?;

        if updated == 0 {
            debug!(project_id = %id, progress, "Progress update skipped");
        }
        Ok(())
    }

    async fn touch(&self, id: &ProjectId) -> StoreResult<()> {
        let url = format!("{}&status=eq.rendering", self.row_url(id));
        let body = json!({ "updated_at": Utc::now() });

        let updated = self
            .execute_request(
                "touch",
                id,
                with_retry(&self.config.retry, "touch", || self.patch_once(&url, &body)),
            )
            .await?;

        if updated == 0 {
            debug!(project_id = %id, "Heartbeat skipped, render no longer active");
        }
        Ok(())
    }

    async fn complete_render(&self, id: &ProjectId, result: &CompletedRender) -> StoreResult<()> {
        let body = json!({
            "status": ProjectStatus::Completed,
            "progress": 100,
            "video_url": result.video_url,
            "subtitle_url": result.subtitle_url,
            "slides": result.slides,
            "duration_seconds": total_duration(&result.slides),
            "updated_at": Utc::now(),
        });
        self.patch_project("complete_render", id, body).await
    }

    async fn fail_render(&self, id: &ProjectId, error: &str) -> StoreResult<()> {
        let body = json!({
            "status": ProjectStatus::Failed,
            "error_message": error,
            "updated_at": Utc::now(),
        });
        self.patch_project("fail_render", id, body).await
    }
}
