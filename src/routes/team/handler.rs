use axum::extract::{Json, Path, State};

use crate::{
    AppState,
    database::TeamMemberRepository,
    error::AppError,
    utils::{ApiResponse, success_to_api_response},
};

use super::model::{SetLabelsRequest, TeamMember, normalize_labels};

#[axum::debug_handler]
pub async fn list_members(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TeamMember>>>, AppError> {
    let members = TeamMemberRepository::list_all(&state.pool).await?;
    Ok(success_to_api_response(
        members.into_iter().map(TeamMember::from).collect(),
    ))
}

/// 标签独立于工单数据保存，刷新工单不会覆盖
#[axum::debug_handler]
pub async fn set_labels(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(req): Json<SetLabelsRequest>,
) -> Result<Json<ApiResponse<TeamMember>>, AppError> {
    let labels = normalize_labels(req.labels).map_err(AppError::Validation)?;
    let member = TeamMemberRepository::set_labels(&state.pool, &account_id, &labels)
        .await?
        .ok_or_else(|| AppError::NotFound("团队成员不存在".into()))?;
    Ok(success_to_api_response(TeamMember::from(member)))
}
