use axum::extract::{Extension, Json, Query, State};

use crate::{
    AppState,
    context::RequestContext,
    credentials::{JiraProfile, normalize_base_url},
    dashboard,
    error::AppError,
    infrastructure::ApiToken,
    jira::JiraClient,
    utils::{ApiResponse, is_valid_project_key, success_to_api_response},
};

use super::model::{BoardQuery, BoardSummary, ConnectRequest, ConnectResponse, ProjectSummary};

/// 保存前先用 `/myself` 验证凭证，失败时不写库
#[axum::debug_handler]
pub async fn connect(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(req): Json<ConnectRequest>,
) -> Result<Json<ApiResponse<ConnectResponse>>, AppError> {
    let base_url = normalize_base_url(&req.base_url)?;
    let email = req.email.trim().to_string();
    let token = ApiToken::new(req.api_token.trim());
    if email.is_empty() {
        return Err(AppError::Validation("Jira 邮箱不能为空".into()));
    }
    if token.is_blank() {
        return Err(AppError::Validation("API 令牌不能为空".into()));
    }

    let client = JiraClient::new(
        state.http.clone(),
        &base_url,
        &email,
        token.clone(),
        state.config.jira_retry_policy(),
    );
    let me = client.myself().await?;

    let profile = JiraProfile {
        display_name: Some(me.display_name.clone()).filter(|n| !n.is_empty()),
        account_id: Some(me.account_id.clone()),
    };
    state
        .credentials
        .store(ctx.user_id, &base_url, &email, &token, &profile)
        .await?;
    // 换了账户后旧缓存不再可信
    state.cache.invalidate(&ctx.owner_key(), None).await;

    let connection = state.credentials.connection(ctx.user_id).await?;
    Ok(success_to_api_response(ConnectResponse { connection }))
}

#[axum::debug_handler]
pub async fn disconnect(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    let removed = dashboard::disconnect_jira(&state, &ctx).await?;
    Ok(success_to_api_response(removed))
}

#[axum::debug_handler]
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ApiResponse<Vec<ProjectSummary>>>, AppError> {
    let projects = dashboard::list_projects(&state, &ctx).await?;
    Ok(success_to_api_response(
        projects.into_iter().map(ProjectSummary::from).collect(),
    ))
}

#[axum::debug_handler]
pub async fn list_boards(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<BoardQuery>,
) -> Result<Json<ApiResponse<Vec<BoardSummary>>>, AppError> {
    let project = query
        .project
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());
    if let Some(key) = project {
        if !is_valid_project_key(key) {
            return Err(AppError::Validation(format!("无效的项目键: {}", key)));
        }
    }
    let boards = dashboard::list_boards(&state, &ctx, project).await?;
    Ok(success_to_api_response(
        boards.into_iter().map(BoardSummary::from).collect(),
    ))
}
