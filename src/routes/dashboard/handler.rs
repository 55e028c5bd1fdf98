use axum::extract::{Extension, Json, Path, Query, State};
use chrono::Utc;

use crate::{
    AppState,
    aggregation::{AggregationContext, IssueInsights, StatusRules, WorklogSummary, aggregate},
    context::RequestContext,
    dashboard,
    database::{IgnoreListRepository, TeamMemberRepository, UserProjectRepository},
    error::AppError,
    jira::Issue,
    utils::{ApiResponse, is_valid_issue_key, is_valid_project_key, success_to_api_response},
};

use super::model::{DashboardRequest, DashboardResponse, InsightsQuery, RefreshQuery};

/// 筛选参数在任何网络请求之前校验
#[axum::debug_handler]
pub async fn project_dashboard(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_key): Path<String>,
    Json(req): Json<DashboardRequest>,
) -> Result<Json<ApiResponse<DashboardResponse>>, AppError> {
    if !is_valid_project_key(&project_key) {
        return Err(AppError::Validation(format!("无效的项目键: {}", project_key)));
    }
    req.filter.validate()?;

    let board_ids = match req.board_ids {
        Some(ids) => ids,
        None => UserProjectRepository::find_active(&state.pool, ctx.user_id, &project_key)
            .await?
            .map(|p| p.boards.0.iter().map(|b| b.id).collect())
            .unwrap_or_default(),
    };

    let loaded =
        dashboard::load_snapshot(&state, &ctx, &project_key, &board_ids, req.force_refresh).await?;

    let (member_labels, ignored_keys, ignored_types) = tokio::try_join!(
        TeamMemberRepository::label_map(&state.pool),
        IgnoreListRepository::ignored_keys(&state.pool, ctx.user_id),
        IgnoreListRepository::ignored_types(&state.pool, ctx.user_id),
    )?;
    let rules = StatusRules::new(
        state.config.terminal_statuses.iter().cloned(),
        state.config.in_progress_statuses.iter().cloned(),
    );
    let aggregation = aggregate(
        &loaded.snapshot.issues,
        &req.filter,
        &AggregationContext {
            today: Utc::now().date_naive(),
            rules: &rules,
            member_labels: &member_labels,
            ignored_keys: &ignored_keys,
            ignored_types: &ignored_types,
        },
    );

    Ok(success_to_api_response(DashboardResponse {
        project_key,
        from_cache: loaded.from_cache,
        fetched_at: loaded.snapshot.fetched_at,
        last_refresh: loaded.last_refresh,
        story_points_field: loaded.snapshot.fields.story_points.clone(),
        aggregation,
    }))
}

/// 手动刷新：清除项目缓存，不带项目时清除该用户全部缓存
#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    let project = query
        .project
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());
    if let Some(key) = project {
        if !is_valid_project_key(key) {
            return Err(AppError::Validation(format!("无效的项目键: {}", key)));
        }
    }
    dashboard::refresh(&state, &ctx, project).await;
    tracing::info!("User {} refreshed cache for {:?}", ctx.user_id, project);
    Ok(success_to_api_response(true))
}

/// 默认从第一个进行中状态算到第一个终态
#[axum::debug_handler]
pub async fn issue_insights(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(issue_key): Path<String>,
    Query(query): Query<InsightsQuery>,
) -> Result<Json<ApiResponse<IssueInsights>>, AppError> {
    check_issue_key(&issue_key)?;
    let start = query
        .start
        .or_else(|| state.config.in_progress_statuses.first().cloned())
        .ok_or_else(|| AppError::Validation("缺少起始状态".into()))?;
    let end = query
        .end
        .or_else(|| state.config.terminal_statuses.first().cloned())
        .ok_or_else(|| AppError::Validation("缺少结束状态".into()))?;

    let insights = dashboard::issue_insights(&state, &ctx, &issue_key, &start, &end).await?;
    Ok(success_to_api_response(insights))
}

#[axum::debug_handler]
pub async fn issue_detail(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(issue_key): Path<String>,
) -> Result<Json<ApiResponse<Issue>>, AppError> {
    check_issue_key(&issue_key)?;
    let issue = dashboard::issue_detail(&state, &ctx, &issue_key).await?;
    Ok(success_to_api_response(issue))
}

/// 按贡献者汇总的工时，总时长降序
#[axum::debug_handler]
pub async fn issue_worklogs(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(issue_key): Path<String>,
) -> Result<Json<ApiResponse<WorklogSummary>>, AppError> {
    check_issue_key(&issue_key)?;
    let summary = dashboard::issue_worklogs(&state, &ctx, &issue_key).await?;
    Ok(success_to_api_response(summary))
}

fn check_issue_key(issue_key: &str) -> Result<(), AppError> {
    if is_valid_issue_key(issue_key) {
        Ok(())
    } else {
        Err(AppError::Validation(format!("无效的工单键: {}", issue_key)))
    }
}
