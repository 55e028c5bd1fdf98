use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use super::{CacheError, CacheStore};

const SCAN_BATCH: usize = 200;

pub struct RedisStore {
    client: redis::Client,
    timeout: Duration,
}

impl RedisStore {
    pub fn new(redis_url: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client =
            redis::Client::open(redis_url).map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    // 连接和命令共用一个超时，Redis 挂掉时不会拖住请求
    async fn run<T, F, Fut>(&self, op: F) -> Result<T, CacheError>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let fut = async {
            let conn = self.client.get_multiplexed_async_connection().await?;
            op(conn).await
        };
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::Unavailable(e.to_string())),
            Err(_) => Err(CacheError::Unavailable("redis operation timed out".into())),
        }
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.run(|mut conn| async move { conn.get(key).await }).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let millis = u64::try_from(ttl.as_millis())
            .map_err(|_| CacheError::InvalidTtl(ttl))?
            .max(1);
        self.run(|mut conn| async move { conn.pset_ex(key, value, millis).await })
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.run(|mut conn| async move { conn.del(key).await }).await
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let pattern = format!("{}*", prefix);
        self.run(|mut conn| async move {
            let mut cursor: u64 = 0;
            let mut removed: u64 = 0;
            loop {
                let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(SCAN_BATCH)
                    .query_async(&mut conn)
                    .await?;
                if !keys.is_empty() {
                    let n: u64 = conn.del(&keys).await?;
                    removed += n;
                }
                if next == 0 {
                    break;
                }
                cursor = next;
            }
            Ok(removed)
        })
        .await
    }

    async fn incr_window(&self, key: &str, window: Duration) -> Result<u64, CacheError> {
        let secs = i64::try_from(window.as_secs().max(1))
            .map_err(|_| CacheError::InvalidTtl(window))?;
        self.run(|mut conn| async move {
            // 使用 Redis 的 INCR 和 EXPIRE 命令实现计数器
            let count: u64 = conn.incr(key, 1).await?;
            if count == 1 {
                let _: () = conn.expire(key, secs).await?;
            }
            Ok(count)
        })
        .await
    }
}
