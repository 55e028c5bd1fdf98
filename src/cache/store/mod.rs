use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

mod memory_store;
mod redis_store;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("ttl out of range: {0:?}")]
    InvalidTtl(Duration),
}

/// 带过期时间的键值存储
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// 覆盖写入，后写者生效
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// 删除所有以 `prefix` 开头的键，返回删除数量
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError>;

    /// 固定窗口计数：首次递增时设置窗口过期
    async fn incr_window(&self, key: &str, window: Duration) -> Result<u64, CacheError>;
}
