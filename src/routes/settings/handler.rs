use axum::extract::{Extension, Json, Path, State};

use crate::{
    AppState,
    context::RequestContext,
    database::{IgnoreListRepository, IgnoredTicketEntity},
    error::AppError,
    utils::{ApiResponse, is_valid_issue_key, success_to_api_response},
};

use super::model::{IgnoreTicketRequest, IgnoredTypes};

#[axum::debug_handler]
pub async fn ignored_tickets(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ApiResponse<Vec<IgnoredTicketEntity>>>, AppError> {
    let tickets = IgnoreListRepository::list_tickets(&state.pool, ctx.user_id).await?;
    Ok(success_to_api_response(tickets))
}

#[axum::debug_handler]
pub async fn ignore_ticket(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<IgnoreTicketRequest>,
) -> Result<Json<ApiResponse<IgnoredTicketEntity>>, AppError> {
    let key = req.ticket_key.trim().to_uppercase();
    if !is_valid_issue_key(&key) {
        return Err(AppError::Validation(format!("无效的工单键: {}", req.ticket_key)));
    }
    let reason = req.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
    let ticket = IgnoreListRepository::ignore_ticket(&state.pool, ctx.user_id, &key, reason).await?;
    Ok(success_to_api_response(ticket))
}

#[axum::debug_handler]
pub async fn unignore_ticket(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(ticket_key): Path<String>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    let removed =
        IgnoreListRepository::unignore_ticket(&state.pool, ctx.user_id, &ticket_key.to_uppercase())
            .await?;
    if !removed {
        return Err(AppError::NotFound("该工单不在忽略列表中".into()));
    }
    Ok(success_to_api_response(true))
}

#[axum::debug_handler]
pub async fn ignored_types(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ApiResponse<IgnoredTypes>>, AppError> {
    let mut issue_types: Vec<String> = IgnoreListRepository::ignored_types(&state.pool, ctx.user_id)
        .await?
        .into_iter()
        .collect();
    issue_types.sort();
    Ok(success_to_api_response(IgnoredTypes { issue_types }))
}

#[axum::debug_handler]
pub async fn set_ignored_types(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<IgnoredTypes>,
) -> Result<Json<ApiResponse<IgnoredTypes>>, AppError> {
    let issue_types = req.normalized();
    IgnoreListRepository::set_ignored_types(&state.pool, ctx.user_id, &issue_types).await?;
    Ok(success_to_api_response(IgnoredTypes { issue_types }))
}
