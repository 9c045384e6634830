//! Project handlers: segmentation preview, creation, lookup and script updates.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use slidecast_models::editor::total_duration;
use slidecast_models::{segment_checked, Project, ProjectId, ProjectSettings, Slide};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::handlers::slides::load_editable;
use crate::state::AppState;

/// Maximum project title length.
const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct SegmentRequest {
    pub script: String,
}

#[derive(Debug, Serialize)]
pub struct SegmentResponse {
    pub slides: Vec<Slide>,
    pub total_duration: u32,
}

/// POST /api/segment
///
/// Preview how a script splits into slides without storing anything.
///
/// Returns:
/// - 200: Slides with their estimated durations
/// - 422: Script produced no slides
pub async fn segment_script(Json(request): Json<SegmentRequest>) -> ApiResult<Json<SegmentResponse>> {
    let slides = segment_checked(&request.script)?;
    Ok(Json(SegmentResponse {
        total_duration: total_duration(&slides),
        slides,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub title: String,
    pub script: String,
    #[serde(default)]
    pub settings: Option<ProjectSettings>,
}

/// POST /api/projects
///
/// Create a draft project. The script is segmented immediately; an empty
/// slide list is allowed here and re-segmented when a render starts.
///
/// Returns:
/// - 201: Created project
/// - 400: Invalid settings or title
pub async fn create_project(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let title = request.title.trim();
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ApiError::bad_request(format!(
            "Title must be at most {} characters",
            MAX_TITLE_CHARS
        )));
    }

    let settings = request.settings.unwrap_or_default();
    settings.validate()?;

    let project = Project::new_draft(title, request.script).with_settings(settings);
    state.store().create_project(&project).await?;
    metrics::record_project_created();

    info!(
        project_id = %project.id,
        slides = project.slides.len(),
        "Project created"
    );

    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects/:project_id
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Project>> {
    let id = ProjectId::from_string(project_id);
    let project = state
        .store()
        .get_project(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("project {}", id)))?;

    Ok(Json(project))
}

#[derive(Debug, Deserialize)]
pub struct UpdateScriptRequest {
    pub script: String,
}

/// PUT /api/projects/:project_id/script
///
/// Replace the script and re-segment it into a fresh slide list.
///
/// Returns:
/// - 200: Updated project
/// - 404: Project not found
/// - 409: A render is in progress
/// - 422: Script produced no slides
pub async fn update_script(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(request): Json<UpdateScriptRequest>,
) -> ApiResult<Json<Project>> {
    let id = ProjectId::from_string(project_id);
    let slides = segment_checked(&request.script)?;

    let project = load_editable(&state, &id, "change the script").await?;

    state
        .store()
        .replace_slides(&id, Some(&request.script), &slides)
        .await?;

    let mut project = project;
    project.replace_slides(Some(request.script), slides);

    info!(project_id = %id, slides = project.slides.len(), "Script updated");

    Ok(Json(project))
}
