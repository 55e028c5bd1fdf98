use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Jira 凭证，令牌只以密文形式存在
#[derive(Debug, Clone, FromRow)]
pub struct CredentialEntity {
    pub user_id: i64,
    pub base_url: String,
    pub email: String,
    pub encrypted_token: String,
    pub jira_display_name: Option<String>,
    pub jira_account_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}
