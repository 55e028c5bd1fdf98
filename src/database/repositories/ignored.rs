use std::collections::HashSet;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::IgnoredTicketEntity;

/// 每个用户的忽略工单和忽略类型
pub struct IgnoreListRepository;

impl IgnoreListRepository {
    pub async fn list_tickets(pool: &SqlitePool, user_id: i64) -> Result<Vec<IgnoredTicketEntity>, sqlx::Error> {
        sqlx::query_as::<_, IgnoredTicketEntity>(
            "SELECT id, user_id, ticket_key, reason, created_at
             FROM ignored_tickets WHERE user_id = ? ORDER BY ticket_key",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn ignored_keys(pool: &SqlitePool, user_id: i64) -> Result<HashSet<String>, sqlx::Error> {
        let keys: Vec<String> =
            sqlx::query_scalar("SELECT ticket_key FROM ignored_tickets WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(pool)
                .await?;
        Ok(keys.into_iter().collect())
    }

    /// 重复忽略同一个工单时更新原因
    pub async fn ignore_ticket(
        pool: &SqlitePool,
        user_id: i64,
        ticket_key: &str,
        reason: Option<&str>,
    ) -> Result<IgnoredTicketEntity, sqlx::Error> {
        sqlx::query_as::<_, IgnoredTicketEntity>(
            "INSERT INTO ignored_tickets (user_id, ticket_key, reason, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id, ticket_key) DO UPDATE SET reason = excluded.reason
             RETURNING id, user_id, ticket_key, reason, created_at",
        )
        .bind(user_id)
        .bind(ticket_key)
        .bind(reason)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn unignore_ticket(pool: &SqlitePool, user_id: i64, ticket_key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ignored_tickets WHERE user_id = ? AND ticket_key = ?")
            .bind(user_id)
            .bind(ticket_key)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn ignored_types(pool: &SqlitePool, user_id: i64) -> Result<HashSet<String>, sqlx::Error> {
        let types: Vec<String> =
            sqlx::query_scalar("SELECT issue_type FROM ignored_issue_types WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(pool)
                .await?;
        Ok(types.into_iter().collect())
    }

    pub async fn set_ignored_types(
        pool: &SqlitePool,
        user_id: i64,
        issue_types: &[String],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM ignored_issue_types WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        for issue_type in issue_types {
            sqlx::query(
                "INSERT INTO ignored_issue_types (user_id, issue_type) VALUES (?, ?)
                 ON CONFLICT(user_id, issue_type) DO NOTHING",
            )
            .bind(user_id)
            .bind(issue_type)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }
}
