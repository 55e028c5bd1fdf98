use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::{UserEntity, UserRole, UserStatus};

const USER_COLUMNS: &str = "id, email, password_hash, role, status, created_at, updated_at";

/// 用户存储库实现
pub struct UserRepository;

impl UserRepository {
    /// 创建用户，邮箱重复时返回唯一约束错误
    pub async fn create(
        pool: &SqlitePool,
        email: &str,
        password_hash: &str,
        role: UserRole,
        status: UserStatus,
    ) -> Result<UserEntity, sqlx::Error> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO users (email, password_hash, role, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserEntity>(&sql)
            .bind(email)
            .bind(password_hash)
            .bind(role)
            .bind(status)
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        sqlx::query_as::<_, UserEntity>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<UserEntity>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        sqlx::query_as::<_, UserEntity>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// 按状态筛选，`None` 返回全部用户
    pub async fn list(pool: &SqlitePool, status: Option<UserStatus>) -> Result<Vec<UserEntity>, sqlx::Error> {
        match status {
            Some(status) => {
                let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE status = ? ORDER BY created_at");
                sqlx::query_as::<_, UserEntity>(&sql)
                    .bind(status)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at");
                sqlx::query_as::<_, UserEntity>(&sql).fetch_all(pool).await
            }
        }
    }

    pub async fn set_status(
        pool: &SqlitePool,
        id: i64,
        status: UserStatus,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let sql = format!(
            "UPDATE users SET status = ?, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserEntity>(&sql)
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// 删除用户，会话、凭证、项目和忽略列表随外键级联删除
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
