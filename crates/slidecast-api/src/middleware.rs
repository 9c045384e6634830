//! API middleware.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderName, HeaderValue, Method, Request, Response};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::Json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Span};
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::{ErrorResponse, InternalErrorMarker, INTERNAL_ERROR_DETAIL};

/// Narration source header on voice preview responses.
pub const NARRATION_SOURCE_HEADER: &str = "x-narration-source";

/// Narration duration header on voice preview responses.
pub const NARRATION_DURATION_HEADER: &str = "x-narration-duration";

/// Create CORS layer.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let exposed_headers = [
        header::CONTENT_LENGTH,
        header::CONTENT_TYPE,
        HeaderName::from_static(NARRATION_SOURCE_HEADER),
        HeaderName::from_static(NARRATION_DURATION_HEADER),
    ];

    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(exposed_headers)
            .allow_origin(Any)
            .max_age(Duration::from_secs(600))
    } else {
        // Credentials cannot be combined with wildcard headers
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
            .expose_headers(exposed_headers)
            .allow_credentials(true)
            .allow_origin(origins)
            .max_age(Duration::from_secs(600))
    }
}

/// Request ID middleware.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response<Body> {
    let request_id = request
        .headers()
        .get("X-Request-ID")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(request_id.clone());
    Span::current().record("request_id", &request_id);

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("X-Request-ID", value);
    }

    response
}

/// Request logging middleware.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    // Status polling and probes are too chatty to log
    let path = uri.path();
    let quiet = matches!(path, "/health" | "/healthz" | "/ready" | "/metrics");
    if !quiet && !path.ends_with("/status") {
        info!(
            method = %method,
            uri = %uri,
            status = %response.status(),
            duration_ms = %start.elapsed().as_millis(),
            "Request completed"
        );
    }

    response
}

/// Hide internal error details from clients in production.
pub async fn redact_internal_errors(
    State(config): State<ApiConfig>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let response = next.run(request).await;
    if !config.is_production() || response.extensions().get::<InternalErrorMarker>().is_none() {
        return response;
    }

    let status = response.status();
    (
        status,
        Json(ErrorResponse {
            detail: INTERNAL_ERROR_DETAIL.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::error::ApiError;

    fn app(environment: &str) -> Router {
        let config = ApiConfig {
            environment: environment.to_string(),
            ..ApiConfig::default()
        };
        Router::new()
            .route("/internal", get(|| async { Err::<(), _>(ApiError::internal("pool exhausted at db-7")) }))
            .route("/missing", get(|| async { Err::<(), _>(ApiError::not_found("project p1")) }))
            .layer(axum::middleware::from_fn_with_state(config, redact_internal_errors))
    }

    async fn detail(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        (status, body["detail"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_production_hides_internal_details() {
        let (status, detail) = detail(app("production"), "/internal").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(detail, INTERNAL_ERROR_DETAIL);
    }

    #[tokio::test]
    async fn test_production_keeps_client_error_details() {
        let (status, detail) = detail(app("Production"), "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(detail.contains("project p1"));
    }

    #[tokio::test]
    async fn test_development_shows_internal_details() {
        let (_, detail) = detail(app("development"), "/internal").await;
        assert!(detail.contains("pool exhausted"));
    }
}
