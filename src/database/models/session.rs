use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// 登录会话，`expires_at` 为 Unix 秒
#[derive(Debug, Clone, FromRow)]
pub struct SessionEntity {
    pub id: i64,
    pub token_hash: String,
    pub user_id: i64,
    pub expires_at: i64,
    pub created_at: DateTime<Utc>,
}
