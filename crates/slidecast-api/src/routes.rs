//! API routes.

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, patch, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::{
    add_slide, create_project, delete_slide, get_project, get_render_status, health, move_slide,
    preview_voice, ready, segment_script, start_render, update_script, update_slide,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, redact_internal_errors, request_id, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let project_routes = Router::new()
        .route("/segment", post(segment_script))
        .route("/projects", post(create_project))
        .route("/projects/:project_id", get(get_project))
        .route("/projects/:project_id/script", put(update_script))
        // Slide editing
        .route("/projects/:project_id/slides", post(add_slide))
        .route(
            "/projects/:project_id/slides/:slide_id",
            patch(update_slide).delete(delete_slide),
        )
        .route("/projects/:project_id/slides/:slide_id/move", post(move_slide))
        // Rendering
        .route("/projects/:project_id/render", post(start_render))
        .route("/projects/:project_id/status", get(get_render_status));

    let voice_routes = Router::new().route("/voice/preview", post(preview_voice));

    let api_routes = Router::new().merge(project_routes).merge(voice_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Locally published assets are served where their URLs point
    let media_routes = match &state.media_root {
        Some(root) => Router::new().nest_service("/media", ServeDir::new(root)),
        None => Router::new(),
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .merge(media_routes)
        .layer(middleware::from_fn_with_state(state.config.clone(), redact_internal_errors))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.request_timeout,
        ))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
