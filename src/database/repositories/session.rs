use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::SessionEntity;

pub struct SessionRepository;

impl SessionRepository {
    pub async fn create(
        pool: &SqlitePool,
        token_hash: &str,
        user_id: i64,
        expires_at: i64,
    ) -> Result<SessionEntity, sqlx::Error> {
        sqlx::query_as::<_, SessionEntity>(
            "INSERT INTO sessions (token_hash, user_id, expires_at, created_at)
             VALUES (?, ?, ?, ?)
             RETURNING id, token_hash, user_id, expires_at, created_at",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// 只返回未过期的会话
    pub async fn find_valid(
        pool: &SqlitePool,
        token_hash: &str,
        now: i64,
    ) -> Result<Option<SessionEntity>, sqlx::Error> {
        sqlx::query_as::<_, SessionEntity>(
            "SELECT id, token_hash, user_id, expires_at, created_at
             FROM sessions WHERE token_hash = ? AND expires_at > ?",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete_by_token_hash(pool: &SqlitePool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_for_user(pool: &SqlitePool, user_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn cleanup_expired(pool: &SqlitePool, now: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
