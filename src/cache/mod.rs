// 缓存模块
// Jira 数据按 (用户, 资源) 缓存，存储不可用时一律按未命中处理

pub mod keys;
pub mod operations;
pub mod store;

pub use operations::DashboardCache;
pub use store::{CacheError, CacheStore, MemoryStore, RedisStore};
