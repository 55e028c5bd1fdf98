use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TeamMemberEntity {
    pub id: i64,
    pub jira_account_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub labels: Json<Vec<String>>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 从工单经办人得到的成员信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTeamMember {
    pub jira_account_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}
