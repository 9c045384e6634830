//! Prometheus metrics for the API server.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Install the Prometheus recorder.
/// Returns a handle that renders the scrape output.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "slidecast_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "slidecast_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "slidecast_http_requests_in_flight";

    // Project metrics
    pub const PROJECTS_CREATED_TOTAL: &str = "slidecast_projects_created_total";
    pub const VOICE_PREVIEWS_TOTAL: &str = "slidecast_voice_previews_total";

    // Render pipeline metrics, recorded by the worker
    pub use slidecast_worker::metrics::names::{
        ASSEMBLY_DURATION, NARRATION_FALLBACKS, RENDERS_COMPLETED, RENDERS_DEDUPLICATED,
        RENDERS_FAILED, RENDERS_STARTED, SLIDE_IMAGE_FALLBACKS,
    };
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_project_created() {
    counter!(names::PROJECTS_CREATED_TOTAL).increment(1);
}

pub fn record_voice_preview(source: &'static str) {
    counter!(names::VOICE_PREVIEWS_TOTAL, "source" => source).increment(1);
}

/// Replace project ids so paths make bounded labels.
fn sanitize_path(path: &str) -> String {
    static PROJECT_ID: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PROJECT_ID.get_or_init(|| Regex::new(r"/projects/[A-Za-z0-9_-]+").ok());

    match pattern {
        Some(re) => re.replace_all(path, "/projects/:id").into_owned(),
        None => path.to_string(),
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}
