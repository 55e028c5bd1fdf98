use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::AppState;
use crate::cache::keys;
use crate::context::RequestContext;
use crate::database::{NewTeamMember, TeamMemberRepository};
use crate::error::AppError;
use crate::jira::{FieldCandidates, FieldMap, Issue, JiraClient, JiraError};

/// 没有看板时按项目 JQL 搜索的工单上限
const MAX_PROJECT_ISSUES: usize = 1000;

/// 缓存中的项目工单快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub project_key: String,
    pub board_ids: Vec<u64>,
    pub fields: FieldMap,
    pub issues: Vec<Issue>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub snapshot: ProjectSnapshot,
    pub from_cache: bool,
    pub last_refresh: Option<DateTime<Utc>>,
}

/// 先读缓存，未命中或强制刷新时从 Jira 拉取并写回
pub async fn load_snapshot(
    state: &AppState,
    ctx: &RequestContext,
    project_key: &str,
    board_ids: &[u64],
    force_refresh: bool,
) -> Result<LoadedSnapshot, AppError> {
    let owner = ctx.owner_key();
    let resource = keys::issues_resource(project_key);
    let board_ids = normalize_board_ids(board_ids);

    if !force_refresh {
        if let Some(snapshot) = state.cache.get::<ProjectSnapshot>(&owner, &resource).await {
            if snapshot.board_ids == board_ids {
                let last_refresh = state.cache.last_refresh(&owner, project_key).await;
                return Ok(LoadedSnapshot {
                    snapshot,
                    from_cache: true,
                    last_refresh,
                });
            }
        }
    }

    let client = ctx.jira_client(state).await?;
    let candidates = field_candidates(state);
    let snapshot = fetch_snapshot(&client, project_key, &board_ids, &candidates, Utc::now()).await?;
    info!(
        "Fetched {} issues for {} from {} boards",
        snapshot.issues.len(),
        project_key,
        board_ids.len()
    );

    // 成员同步失败不影响本次仪表盘
    let members = observed_members(&snapshot.issues);
    if let Err(e) = TeamMemberRepository::upsert_many(&state.pool, &members, ctx.user_id).await {
        warn!("Failed to sync team members: {}", e);
    }

    state
        .cache
        .set(&owner, &resource, &snapshot, state.cache.default_ttl())
        .await;
    state
        .cache
        .record_refresh(&owner, project_key, snapshot.fetched_at)
        .await;

    Ok(LoadedSnapshot {
        last_refresh: Some(snapshot.fetched_at),
        snapshot,
        from_cache: false,
    })
}

/// 并发拉取看板配置和字段列表，再并发拉取各看板的工单
pub async fn fetch_snapshot(
    client: &JiraClient,
    project_key: &str,
    board_ids: &[u64],
    candidates: &FieldCandidates,
    fetched_at: DateTime<Utc>,
) -> Result<ProjectSnapshot, JiraError> {
    let configs = try_join_all(board_ids.iter().map(|id| client.board_configuration(*id)));
    let (configs, fields) = futures_util::try_join!(configs, client.list_fields())?;
    let field_map = FieldMap::resolve(&configs, &fields, candidates);
    let requested = field_map.request_fields();

    let raw = if board_ids.is_empty() {
        let jql = format!("project = \"{}\" ORDER BY updated DESC", project_key);
        client
            .search_issues(&jql, &requested, MAX_PROJECT_ISSUES)
            .await?
    } else {
        try_join_all(
            board_ids
                .iter()
                .map(|id| client.board_issues(*id, None, &requested)),
        )
        .await?
        .into_iter()
        .flatten()
        .collect()
    };

    // 同一工单可能出现在多个看板上
    let mut seen = HashSet::new();
    let issues = raw
        .into_iter()
        .filter(|issue| seen.insert(issue.key.clone()))
        .map(|issue| issue.into_issue(&field_map))
        .collect();

    Ok(ProjectSnapshot {
        project_key: project_key.to_string(),
        board_ids: board_ids.to_vec(),
        fields: field_map,
        issues,
        fetched_at,
    })
}

/// 工单中出现过的经办人，按 accountId 去重
pub fn observed_members(issues: &[Issue]) -> Vec<NewTeamMember> {
    let mut seen = HashSet::new();
    issues
        .iter()
        .filter_map(|issue| issue.assignee.as_ref())
        .filter(|a| !a.account_id.is_empty() && seen.insert(a.account_id.clone()))
        .map(|a| NewTeamMember {
            jira_account_id: a.account_id.clone(),
            display_name: a.display_name.clone(),
            email: a.email.clone(),
            avatar_url: a.avatar_url.clone(),
        })
        .collect()
}

pub(crate) fn field_candidates(state: &AppState) -> FieldCandidates {
    FieldCandidates {
        story_points: state.config.story_point_fields.clone(),
        sprint: state.config.sprint_fields.clone(),
        team: state.config.team_fields.clone(),
    }
}

fn normalize_board_ids(board_ids: &[u64]) -> Vec<u64> {
    let mut ids = board_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jira::Assignee;

    fn issue(key: &str, account: Option<&str>) -> Issue {
        Issue {
            key: key.into(),
            summary: String::new(),
            status: "Open".into(),
            status_category: None,
            assignee: account.map(|id| Assignee {
                account_id: id.into(),
                display_name: format!("Name {id}"),
                email: None,
                avatar_url: None,
            }),
            issue_type: "Task".into(),
            priority: None,
            created: None,
            updated: None,
            resolved: None,
            due_date: None,
            labels: vec![],
            story_points: None,
            sprint: None,
            team: None,
        }
    }

    #[test]
    fn observed_members_are_unique() {
        let issues = [
            issue("A-1", Some("x")),
            issue("A-2", None),
            issue("A-3", Some("x")),
            issue("A-4", Some("y")),
        ];
        let members = observed_members(&issues);
        let ids: Vec<_> = members.iter().map(|m| m.jira_account_id.as_str()).collect();
        assert_eq!(ids, ["x", "y"]);
    }

    #[test]
    fn board_ids_are_sorted_and_deduplicated() {
        assert_eq!(normalize_board_ids(&[3, 1, 3, 2]), vec![1, 2, 3]);
    }
}
