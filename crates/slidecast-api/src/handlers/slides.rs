//! Slide editing handlers.
//!
//! Each edit loads the slide list, applies one editor operation and writes
//! the whole list back. Edits are refused while a render is running.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use slidecast_models::editor;
use slidecast_models::{Project, ProjectId, Slide};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Load a project that may be edited.
pub(crate) async fn load_editable(state: &AppState, id: &ProjectId, action: &str) -> ApiResult<Project> {
    let project = state
        .store()
        .get_project(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("project {}", id)))?;

    let stale_after = state.orchestrator.context().config.stale_after_secs();
    if state.orchestrator.is_active(id) || project.has_active_render(stale_after) {
        return Err(ApiError::Conflict(format!(
            "Cannot {} while a render is in progress",
            action
        )));
    }
    Ok(project)
}

/// Persist an edited slide list and return the updated project.
async fn save_slides(state: &AppState, mut project: Project, slides: Vec<Slide>) -> ApiResult<Json<Project>> {
    state.store().replace_slides(&project.id, None, &slides).await?;
    project.replace_slides(None, slides);
    Ok(Json(project))
}

/// POST /api/projects/:project_id/slides
///
/// Append a blank slide using the project's default template.
///
/// Returns:
/// - 201: Updated project
/// - 404: Project not found
/// - 409: A render is in progress
pub async fn add_slide(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let id = ProjectId::from_string(project_id);
    let project = load_editable(&state, &id, "edit slides").await?;

    let mut slides = project.slides.clone();
    let added = editor::insert_blank(&mut slides, project.settings.template).order;
    info!(project_id = %id, order = added, "Slide added");

    let project = save_slides(&state, project, slides).await?;
    Ok((StatusCode::CREATED, project))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSlideRequest {
    pub text: String,
}

/// PATCH /api/projects/:project_id/slides/:slide_id
///
/// Replace one slide's text. Its duration is re-estimated and its
/// generated assets are dropped.
///
/// Returns:
/// - 200: Updated project
/// - 404: Project or slide not found
/// - 409: A render is in progress
pub async fn update_slide(
    State(state): State<AppState>,
    Path((project_id, slide_id)): Path<(String, String)>,
    Json(request): Json<UpdateSlideRequest>,
) -> ApiResult<Json<Project>> {
    let id = ProjectId::from_string(project_id);
    let project = load_editable(&state, &id, "edit slides").await?;

    let mut slides = project.slides.clone();
    if !editor::update_text(&mut slides, &slide_id, request.text) {
        return Err(ApiError::not_found(format!("slide {}", slide_id)));
    }
    info!(project_id = %id, slide_id = %slide_id, "Slide text updated");

    save_slides(&state, project, slides).await
}

/// DELETE /api/projects/:project_id/slides/:slide_id
///
/// Returns:
/// - 200: Updated project, remaining slides renumbered
/// - 404: Project or slide not found
/// - 409: A render is in progress
pub async fn delete_slide(
    State(state): State<AppState>,
    Path((project_id, slide_id)): Path<(String, String)>,
) -> ApiResult<Json<Project>> {
    let id = ProjectId::from_string(project_id);
    let project = load_editable(&state, &id, "edit slides").await?;

    let mut slides = project.slides.clone();
    if !editor::remove(&mut slides, &slide_id) {
        return Err(ApiError::not_found(format!("slide {}", slide_id)));
    }
    info!(project_id = %id, slide_id = %slide_id, "Slide removed");

    save_slides(&state, project, slides).await
}

#[derive(Debug, Deserialize)]
pub struct MoveSlideRequest {
    /// Target 1-based position
    pub to: u32,
}

/// POST /api/projects/:project_id/slides/:slide_id/move
///
/// Returns:
/// - 200: Updated project
/// - 400: Target position out of range
/// - 404: Project or slide not found
/// - 409: A render is in progress
pub async fn move_slide(
    State(state): State<AppState>,
    Path((project_id, slide_id)): Path<(String, String)>,
    Json(request): Json<MoveSlideRequest>,
) -> ApiResult<Json<Project>> {
    let id = ProjectId::from_string(project_id);
    let project = load_editable(&state, &id, "edit slides").await?;

    let mut slides = project.slides.clone();
    let from = slides
        .iter()
        .position(|s| s.id == slide_id)
        .ok_or_else(|| ApiError::not_found(format!("slide {}", slide_id)))?;
    let to = (request.to as usize).checked_sub(1).unwrap_or(usize::MAX);
    if !editor::move_slide(&mut slides, from, to) {
        return Err(ApiError::bad_request(format!(
            "Position must be between 1 and {}",
            slides.len()
        )));
    }
    info!(project_id = %id, slide_id = %slide_id, to = request.to, "Slide moved");

    save_slides(&state, project, slides).await
}
