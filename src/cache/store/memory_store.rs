use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheError, CacheStore};

/// 进程内存储，未配置 Redis 时使用
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn deadline(from: Instant, ttl: Duration) -> Result<Instant, CacheError> {
    from.checked_add(ttl).ok_or(CacheError::InvalidTtl(ttl))
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // 过期条目顺手清理
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value,
            expires_at: deadline(Instant::now(), ttl)?,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn incr_window(&self, key: &str, window: Duration) -> Result<u64, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let current = entries
            .get(key)
            .filter(|e| e.expires_at > now)
            .and_then(|e| e.value.parse::<u64>().ok());

        let (count, expires_at) = match (current, entries.get(key)) {
            (Some(n), Some(e)) => (n + 1, e.expires_at),
            _ => (1, deadline(now, window)?),
        };
        entries.insert(
            key.to_string(),
            Entry {
                value: count.to_string(),
                expires_at,
            },
        );
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn value_expires_after_ttl() {
        let store = MemoryStore::new();
        store
            .set("k", "v".into(), Duration::from_millis(30))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unrepresentable_ttl_is_an_error() {
        let store = MemoryStore::new();
        let err = store.set("k", "v".into(), Duration::MAX).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidTtl(_)));
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.incr_window("c", Duration::MAX).await.is_err());
    }

    #[tokio::test]
    async fn later_set_wins() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        store.set("k", "first".into(), ttl).await.unwrap();
        store.set("k", "second".into(), ttl).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn prefix_delete_leaves_other_owners() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        store.set("jira:user:1:a", "1".into(), ttl).await.unwrap();
        store.set("jira:user:1:b", "2".into(), ttl).await.unwrap();
        store.set("jira:user:12:a", "3".into(), ttl).await.unwrap();

        assert_eq!(store.delete_prefix("jira:user:1:").await.unwrap(), 2);
        assert!(store.get("jira:user:12:a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn counter_resets_after_window() {
        let store = MemoryStore::new();
        let window = Duration::from_millis(40);
        assert_eq!(store.incr_window("c", window).await.unwrap(), 1);
        assert_eq!(store.incr_window("c", window).await.unwrap(), 2);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.incr_window("c", window).await.unwrap(), 1);
    }
}
