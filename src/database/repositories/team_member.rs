use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::types::Json;

use crate::database::models::{NewTeamMember, TeamMemberEntity};

const MEMBER_COLUMNS: &str = "id, jira_account_id, display_name, email, avatar_url, labels, created_by, created_at, updated_at";

pub struct TeamMemberRepository;

impl TeamMemberRepository {
    /// 新成员插入，已有成员只刷新显示信息，不改标签
    pub async fn upsert_many(
        pool: &SqlitePool,
        members: &[NewTeamMember],
        created_by: i64,
    ) -> Result<(), sqlx::Error> {
        if members.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let mut tx = pool.begin().await?;
        for member in members {
            sqlx::query(
                "INSERT INTO team_members
                     (jira_account_id, display_name, email, avatar_url, labels, created_by, created_at, updated_at)
                 VALUES (?, ?, ?, ?, '[]', ?, ?, ?)
                 ON CONFLICT(jira_account_id) DO UPDATE SET
                     display_name = excluded.display_name,
                     email = COALESCE(excluded.email, team_members.email),
                     avatar_url = COALESCE(excluded.avatar_url, team_members.avatar_url),
                     updated_at = excluded.updated_at",
            )
            .bind(&member.jira_account_id)
            .bind(&member.display_name)
            .bind(&member.email)
            .bind(&member.avatar_url)
            .bind(created_by)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }

    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<TeamMemberEntity>, sqlx::Error> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM team_members ORDER BY display_name");
        sqlx::query_as::<_, TeamMemberEntity>(&sql).fetch_all(pool).await
    }

    pub async fn set_labels(
        pool: &SqlitePool,
        jira_account_id: &str,
        labels: &[String],
    ) -> Result<Option<TeamMemberEntity>, sqlx::Error> {
        let sql = format!(
            "UPDATE team_members SET labels = ?, updated_at = ? WHERE jira_account_id = ?
             RETURNING {MEMBER_COLUMNS}"
        );
        sqlx::query_as::<_, TeamMemberEntity>(&sql)
            .bind(Json(labels))
            .bind(Utc::now())
            .bind(jira_account_id)
            .fetch_optional(pool)
            .await
    }

    /// 显示名 → 标签，供团队标签筛选使用
    pub async fn label_map(pool: &SqlitePool) -> Result<HashMap<String, Vec<String>>, sqlx::Error> {
        let members = Self::list_all(pool).await?;
        Ok(members
            .into_iter()
            .filter(|m| !m.labels.0.is_empty())
            .map(|m| (m.display_name, m.labels.0))
            .collect())
    }
}
