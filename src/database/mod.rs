// 数据库模块
// 包含数据库实体定义和存储库操作

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub mod models; // 数据库实体定义
pub mod repositories; // 存储库实现

pub use models::{
    CredentialEntity, IgnoredTicketEntity, NewTeamMember, SessionEntity, TeamMemberEntity,
    TrackedBoard, TrackedProject, UserEntity, UserProjectEntity, UserRole, UserStatus,
};
pub use repositories::{
    CredentialRepository, IgnoreListRepository, SessionRepository, TeamMemberRepository,
    UserProjectRepository, UserRepository,
};

/// 建立连接池并执行内嵌的迁移脚本
///
/// 内存数据库只能有一个连接，且连接不能被回收，否则数据会丢失。
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?
    };

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
