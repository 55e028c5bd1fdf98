use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct IgnoredTicketEntity {
    pub id: i64,
    pub user_id: i64,
    pub ticket_key: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}
