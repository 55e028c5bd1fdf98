use axum::extract::{Extension, Json, State};

use crate::{
    AppState,
    context::RequestContext,
    database::{TrackedProject, UserProjectRepository},
    error::AppError,
    utils::{ApiResponse, success_to_api_response},
};

use super::model::SaveProjectsRequest;

#[axum::debug_handler]
pub async fn list_tracked(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ApiResponse<Vec<TrackedProject>>>, AppError> {
    let projects = UserProjectRepository::list_active(&state.pool, ctx.user_id).await?;
    Ok(success_to_api_response(
        projects.into_iter().map(TrackedProject::from).collect(),
    ))
}

#[axum::debug_handler]
pub async fn save_tracked(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<SaveProjectsRequest>,
) -> Result<Json<ApiResponse<Vec<TrackedProject>>>, AppError> {
    let projects = req.into_validated().map_err(AppError::Validation)?;
    let saved = UserProjectRepository::replace_selection(&state.pool, ctx.user_id, &projects).await?;
    tracing::info!("User {} now tracks {} projects", ctx.user_id, saved.len());
    Ok(success_to_api_response(
        saved.into_iter().map(TrackedProject::from).collect(),
    ))
}
