use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedBoard {
    pub id: u64,
    pub name: String,
}

/// 用户选择跟踪的项目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedProject {
    pub project_key: String,
    pub project_name: String,
    #[serde(default)]
    pub boards: Vec<TrackedBoard>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserProjectEntity {
    pub id: i64,
    pub user_id: i64,
    pub project_key: String,
    pub project_name: String,
    pub boards: Json<Vec<TrackedBoard>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProjectEntity> for TrackedProject {
    fn from(entity: UserProjectEntity) -> Self {
        TrackedProject {
            project_key: entity.project_key,
            project_name: entity.project_name,
            boards: entity.boards.0,
        }
    }
}
