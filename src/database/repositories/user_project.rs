use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::types::Json;

use crate::database::models::{TrackedProject, UserProjectEntity};

const PROJECT_COLUMNS: &str =
    "id, user_id, project_key, project_name, boards, is_active, created_at, updated_at";

pub struct UserProjectRepository;

impl UserProjectRepository {
    pub async fn list_active(pool: &SqlitePool, user_id: i64) -> Result<Vec<UserProjectEntity>, sqlx::Error> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM user_projects
             WHERE user_id = ? AND is_active = 1 ORDER BY project_key"
        );
        sqlx::query_as::<_, UserProjectEntity>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_active(
        pool: &SqlitePool,
        user_id: i64,
        project_key: &str,
    ) -> Result<Option<UserProjectEntity>, sqlx::Error> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM user_projects
             WHERE user_id = ? AND project_key = ? AND is_active = 1"
        );
        sqlx::query_as::<_, UserProjectEntity>(&sql)
            .bind(user_id)
            .bind(project_key)
            .fetch_optional(pool)
            .await
    }

    /// 用新的选择替换当前跟踪列表，未选中的项目标记为停用
    pub async fn replace_selection(
        pool: &SqlitePool,
        user_id: i64,
        projects: &[TrackedProject],
    ) -> Result<Vec<UserProjectEntity>, sqlx::Error> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE user_projects SET is_active = 0, updated_at = ? WHERE user_id = ?")
            .bind(now)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for project in projects {
            sqlx::query(
                "INSERT INTO user_projects
                     (user_id, project_key, project_name, boards, is_active, created_at, updated_at)
                 VALUES (?, ?, ?, ?, 1, ?, ?)
                 ON CONFLICT(user_id, project_key) DO UPDATE SET
                     project_name = excluded.project_name,
                     boards = excluded.boards,
                     is_active = 1,
                     updated_at = excluded.updated_at",
            )
            .bind(user_id)
            .bind(&project.project_key)
            .bind(&project.project_name)
            .bind(Json(&project.boards))
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Self::list_active(pool, user_id).await
    }
}
