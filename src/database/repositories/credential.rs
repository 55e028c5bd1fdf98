use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::CredentialEntity;

pub struct CredentialRepository;

impl CredentialRepository {
    /// 单条 upsert 语句完成替换，读者不会看到新旧混合的记录
    pub async fn upsert(
        pool: &SqlitePool,
        user_id: i64,
        base_url: &str,
        email: &str,
        encrypted_token: &str,
        jira_display_name: Option<&str>,
        jira_account_id: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO jira_credentials
                 (user_id, base_url, email, encrypted_token, jira_display_name, jira_account_id, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 base_url = excluded.base_url,
                 email = excluded.email,
                 encrypted_token = excluded.encrypted_token,
                 jira_display_name = excluded.jira_display_name,
                 jira_account_id = excluded.jira_account_id,
                 updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(base_url)
        .bind(email)
        .bind(encrypted_token)
        .bind(jira_display_name)
        .bind(jira_account_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find(pool: &SqlitePool, user_id: i64) -> Result<Option<CredentialEntity>, sqlx::Error> {
        sqlx::query_as::<_, CredentialEntity>(
            "SELECT user_id, base_url, email, encrypted_token, jira_display_name, jira_account_id, updated_at
             FROM jira_credentials WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM jira_credentials WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
