use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::AppState;
use crate::aggregation::{IssueInsights, WorklogSummary, build_insights, summarize_worklogs};
use crate::cache::keys;
use crate::context::RequestContext;
use crate::error::AppError;
use crate::jira::types::{ChangelogEntry, JiraBoard, JiraProject};
use crate::jira::{FieldMap, Issue, Worklog};

use super::snapshot::{ProjectSnapshot, field_candidates};

// 缓存读穿：命中直接返回，否则拉取后写入
async fn read_through<T, F, Fut>(
    state: &AppState,
    ctx: &RequestContext,
    resource: &str,
    fetch: F,
) -> Result<T, AppError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let owner = ctx.owner_key();
    if let Some(hit) = state.cache.get::<T>(&owner, resource).await {
        return Ok(hit);
    }
    let value = fetch().await?;
    state
        .cache
        .set(&owner, resource, &value, state.cache.default_ttl())
        .await;
    Ok(value)
}

pub async fn list_projects(state: &AppState, ctx: &RequestContext) -> Result<Vec<JiraProject>, AppError> {
    read_through(state, ctx, &keys::projects_resource(), || async {
        let client = ctx.jira_client(state).await?;
        Ok(client.list_projects().await?)
    })
    .await
}

pub async fn list_boards(
    state: &AppState,
    ctx: &RequestContext,
    project_key: Option<&str>,
) -> Result<Vec<JiraBoard>, AppError> {
    read_through(state, ctx, &keys::boards_resource(project_key), || async {
        let client = ctx.jira_client(state).await?;
        Ok(client.list_boards(project_key).await?)
    })
    .await
}

/// 工单流转分析，变更记录按工单缓存
pub async fn issue_insights(
    state: &AppState,
    ctx: &RequestContext,
    issue_key: &str,
    start_status: &str,
    end_status: &str,
) -> Result<IssueInsights, AppError> {
    let entries: Vec<ChangelogEntry> =
        read_through(state, ctx, &keys::changelog_resource(issue_key), || async {
            let client = ctx.jira_client(state).await?;
            Ok(client.issue_changelog(issue_key).await?)
        })
        .await?;

    Ok(build_insights(issue_key, &entries, start_status, end_status))
}

/// 工单详情；项目快照已缓存时沿用其字段映射，否则重新发现自定义字段
pub async fn issue_detail(
    state: &AppState,
    ctx: &RequestContext,
    issue_key: &str,
) -> Result<Issue, AppError> {
    let owner = ctx.owner_key();
    read_through(state, ctx, &keys::issue_resource(issue_key), || async {
        let client = ctx.jira_client(state).await?;
        let project_key = issue_key.rsplit_once('-').map(|(p, _)| p).unwrap_or(issue_key);
        let cached = state
            .cache
            .get::<ProjectSnapshot>(&owner, &keys::issues_resource(project_key))
            .await;
        let field_map = match cached {
            Some(snapshot) => snapshot.fields,
            None => {
                let fields = client.list_fields().await?;
                FieldMap::resolve(&[], &fields, &field_candidates(state))
            }
        };
        let raw = client.issue(issue_key, &field_map.request_fields()).await?;
        Ok(raw.into_issue(&field_map))
    })
    .await
}

/// 工单工时按贡献者汇总，原始记录按工单缓存
pub async fn issue_worklogs(
    state: &AppState,
    ctx: &RequestContext,
    issue_key: &str,
) -> Result<WorklogSummary, AppError> {
    let worklogs: Vec<Worklog> =
        read_through(state, ctx, &keys::worklogs_resource(issue_key), || async {
            let client = ctx.jira_client(state).await?;
            Ok(client.issue_worklogs(issue_key).await?)
        })
        .await?;

    Ok(summarize_worklogs(issue_key, &worklogs))
}

/// 清除某个项目或全部缓存
pub async fn refresh(state: &AppState, ctx: &RequestContext, project_key: Option<&str>) {
    let owner = ctx.owner_key();
    match project_key {
        Some(key) => state.cache.invalidate_project(&owner, key).await,
        None => state.cache.invalidate(&owner, None).await,
    }
}

/// 删除凭证并清空该用户的缓存
pub async fn disconnect_jira(state: &AppState, ctx: &RequestContext) -> Result<bool, AppError> {
    let removed = state.credentials.remove(ctx.user_id).await?;
    state.cache.invalidate(&ctx.owner_key(), None).await;
    if removed {
        tracing::info!("User {} disconnected Jira", ctx.user_id);
    }
    Ok(removed)
}
