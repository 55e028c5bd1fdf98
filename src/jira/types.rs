//! Jira REST v3 / Agile v1.0 响应结构
//!
//! 只声明用到的字段，其余字段在反序列化时忽略。

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields::FieldMap;

pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    pub account_id: String,
    #[serde(default)]
    pub display_name: String,
    pub email_address: Option<String>,
    #[serde(default)]
    pub active: bool,
    pub avatar_urls: Option<HashMap<String, String>>,
}

impl JiraUser {
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar_urls
            .as_ref()
            .and_then(|urls| urls.get("48x48").or_else(|| urls.values().next()))
            .cloned()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JiraProject {
    pub id: String,
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedValues<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub max_results: u64,
    pub total: Option<u64>,
    #[serde(default = "default_true")]
    pub is_last: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoardLocation {
    pub project_id: Option<u64>,
    pub project_key: Option<String>,
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JiraBoard {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub board_type: Option<String>,
    pub location: Option<BoardLocation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationField {
    pub field_id: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Estimation {
    pub field: Option<EstimationField>,
    #[serde(rename = "type")]
    pub estimation_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfiguration {
    pub id: u64,
    pub name: Option<String>,
    pub estimation: Option<Estimation>,
}

impl BoardConfiguration {
    /// 看板估算所用的故事点字段ID
    pub fn story_points_field(&self) -> Option<&str> {
        self.estimation
            .as_ref()
            .and_then(|e| e.field.as_ref())
            .map(|f| f.field_id.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JiraSprint {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub state: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub complete_date: Option<String>,
    pub goal: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JiraField {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub clause_names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedValue {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusCategory {
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatus {
    pub name: String,
    pub status_category: Option<StatusCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiIssueFields {
    pub summary: Option<String>,
    pub status: Option<ApiStatus>,
    pub assignee: Option<JiraUser>,
    pub issuetype: Option<NamedValue>,
    pub priority: Option<NamedValue>,
    pub duedate: Option<String>,
    pub labels: Option<Vec<String>>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub resolutiondate: Option<String>,
    /// 自定义字段（故事点、Sprint、Team 等）
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiIssue {
    pub key: String,
    pub fields: ApiIssueFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub issues: Vec<ApiIssue>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardIssuePage {
    #[serde(default)]
    pub issues: Vec<ApiIssue>,
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub max_results: u64,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeItem {
    pub field: String,
    pub from_string: Option<String>,
    pub to_string: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub created: String,
    #[serde(default)]
    pub items: Vec<ChangeItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorklogAuthor {
    pub account_id: Option<String>,
    pub display_name: Option<String>,
    pub email_address: Option<String>,
}

/// 单条工时记录，`comment` 是 ADF 文档，不保留
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Worklog {
    pub id: Option<String>,
    pub author: Option<WorklogAuthor>,
    pub time_spent: Option<String>,
    pub time_spent_seconds: Option<u64>,
    pub started: Option<String>,
    pub created: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogPage {
    #[serde(default)]
    pub worklogs: Vec<Worklog>,
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub max_results: u64,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub error_messages: Vec<String>,
    #[serde(default)]
    pub errors: HashMap<String, String>,
}

impl ErrorBody {
    pub fn summary(&self) -> Option<String> {
        let mut parts = self.error_messages.clone();
        let mut keyed: Vec<_> = self.errors.iter().collect();
        keyed.sort();
        parts.extend(keyed.into_iter().map(|(k, v)| format!("{k}: {v}")));
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignee {
    pub account_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// 归一化后的工单，只存在于缓存和聚合过程中
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub status_category: Option<String>,
    pub assignee: Option<Assignee>,
    pub issue_type: String,
    pub priority: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub resolved: Option<DateTime<Utc>>,
    pub due_date: Option<NaiveDate>,
    pub labels: Vec<String>,
    pub story_points: Option<f64>,
    pub sprint: Option<String>,
    pub team: Option<String>,
}

impl Issue {
    pub fn assignee_name(&self) -> &str {
        self.assignee
            .as_ref()
            .map(|a| a.display_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNASSIGNED)
    }
}

impl ApiIssue {
    pub fn into_issue(self, fields: &FieldMap) -> Issue {
        let ApiIssue { key, fields: raw } = self;
        let custom = |id: &Option<String>| id.as_ref().and_then(|id| raw.extra.get(id));

        let story_points = custom(&fields.story_points).and_then(number_value);
        let sprint = custom(&fields.sprint).and_then(sprint_name);
        let team = custom(&fields.team).and_then(team_name);

        let (status, status_category) = match raw.status {
            Some(s) => (s.name, s.status_category.map(|c| c.key)),
            None => (String::new(), None),
        };

        Issue {
            key,
            summary: raw.summary.unwrap_or_default(),
            status,
            status_category,
            assignee: raw.assignee.map(|user| Assignee {
                avatar_url: user.avatar_url(),
                account_id: user.account_id,
                display_name: user.display_name,
                email: user.email_address,
            }),
            issue_type: raw.issuetype.map(|t| t.name).unwrap_or_default(),
            priority: raw.priority.map(|p| p.name),
            created: raw.created.as_deref().and_then(parse_jira_datetime),
            updated: raw.updated.as_deref().and_then(parse_jira_datetime),
            resolved: raw.resolutiondate.as_deref().and_then(parse_jira_datetime),
            due_date: raw
                .duedate
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            labels: raw.labels.unwrap_or_default(),
            story_points,
            sprint,
            team,
        }
    }
}

/// Jira 时间戳通常是 `2024-01-15T10:30:00.000+0000`，偏移量不带冒号
pub fn parse_jira_datetime(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

// 数组时取最后一个（当前或最近的 Sprint）
fn sprint_name(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().rev().find_map(sprint_name),
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn team_name(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(team_name),
        Value::Object(map) => ["name", "title", "value"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::to_string),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
