//! Render handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use slidecast_models::{ProjectId, RenderStatus};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Response for a render request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRenderResponse {
    /// Render jobs are keyed by project
    pub job_id: String,
    /// False when a render was already running and nothing new started
    pub accepted: bool,
}

/// POST /api/projects/:project_id/render
///
/// Start rendering a project. Idempotent while a render is active.
///
/// Returns:
/// - 202: Render started, or already running (`accepted: false`)
/// - 404: Project not found
pub async fn start_render(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<(StatusCode, Json<StartRenderResponse>)> {
    let id = ProjectId::from_string(project_id);
    let handle = state.orchestrator.start_render(&id).await?;

    info!(project_id = %id, accepted = handle.accepted, "Render requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(StartRenderResponse {
            job_id: handle.project_id.to_string(),
            accepted: handle.accepted,
        }),
    ))
}

/// GET /api/projects/:project_id/status
///
/// Returns:
/// - 200: Current render status
/// - 404: Project not found
pub async fn get_render_status(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<RenderStatus>> {
    let id = ProjectId::from_string(project_id);
    let status = state
        .store()
        .get_status(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("project {}", id)))?;

    Ok(Json(status))
}
