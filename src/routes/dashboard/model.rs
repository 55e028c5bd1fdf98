use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregation::{Aggregation, IssueFilter};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DashboardRequest {
    /// 为空时使用已跟踪项目保存的看板
    pub board_ids: Option<Vec<u64>>,
    pub filter: IssueFilter,
    pub force_refresh: bool,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub project_key: String,
    pub from_cache: bool,
    pub fetched_at: DateTime<Utc>,
    pub last_refresh: Option<DateTime<Utc>>,
    pub story_points_field: Option<String>,
    #[serde(flatten)]
    pub aggregation: Aggregation,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshQuery {
    pub project: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InsightsQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}
