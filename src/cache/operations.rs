use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::keys;
use super::store::CacheStore;

/// Jira 数据缓存操作
///
/// 读写失败只记录日志：读失败按未命中处理，写失败直接返回。
#[derive(Clone)]
pub struct DashboardCache {
    store: Arc<dyn CacheStore>,
    default_ttl: Duration,
}

impl DashboardCache {
    pub fn new(store: Arc<dyn CacheStore>, default_ttl: Duration) -> Self {
        Self { store, default_ttl }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get<T: DeserializeOwned>(&self, owner: &str, resource: &str) -> Option<T> {
        let key = keys::entry_key(owner, resource);
        match self.store.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!("Cache hit: {}", key);
                    Some(value)
                }
                Err(e) => {
                    warn!("Discarding undecodable cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Cache read failed for {}, treating as miss: {}", key, e);
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, owner: &str, resource: &str, payload: &T, ttl: Duration) {
        let key = keys::entry_key(owner, resource);
        let raw = match serde_json::to_string(payload) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.store.set(&key, raw, ttl).await {
            warn!("Cache write failed for {}: {}", key, e);
        }
    }

    /// 省略 `resource` 时清空该所有者的全部缓存
    pub async fn invalidate(&self, owner: &str, resource: Option<&str>) {
        let result = match resource {
            Some(resource) => self.store.delete(&keys::entry_key(owner, resource)).await,
            None => self
                .store
                .delete_prefix(&keys::owner_prefix(owner))
                .await
                .map(|n| debug!("Invalidated {} cache entries for {}", n, owner)),
        };
        if let Err(e) = result {
            warn!("Cache invalidation failed for {}: {}", owner, e);
        }
    }

    /// 清除某个项目的工单快照、刷新时间，以及该项目工单的详情、变更记录和工时
    pub async fn invalidate_project(&self, owner: &str, project_key: &str) {
        self.invalidate(owner, Some(&keys::issues_resource(project_key)))
            .await;
        self.invalidate(owner, Some(&keys::last_refresh_resource(project_key)))
            .await;
        for prefix in keys::project_issue_prefixes(project_key) {
            let prefix = keys::entry_key(owner, &prefix);
            match self.store.delete_prefix(&prefix).await {
                Ok(n) => debug!("Invalidated {} cache entries under {}", n, prefix),
                Err(e) => warn!("Cache invalidation failed for {}: {}", prefix, e),
            }
        }
    }

    pub async fn last_refresh(&self, owner: &str, project_key: &str) -> Option<DateTime<Utc>> {
        self.get(owner, &keys::last_refresh_resource(project_key))
            .await
    }

    pub async fn record_refresh(&self, owner: &str, project_key: &str, at: DateTime<Utc>) {
        self.set(
            owner,
            &keys::last_refresh_resource(project_key),
            &at,
            self.default_ttl,
        )
        .await;
    }

    /// 固定窗口计数，存储不可用时返回 `None`
    pub async fn hit_counter(&self, client: &str, window: Duration) -> Option<u64> {
        let key = keys::rate_limit_key(client);
        match self.store.incr_window(&key, window).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("Rate limit counter unavailable: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;

    fn cache() -> DashboardCache {
        DashboardCache::new(Arc::new(MemoryStore::new()), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn round_trip_and_targeted_invalidate() {
        let cache = cache();
        let ttl = cache.default_ttl();
        cache.set("user:1", "projects", &vec!["ACME"], ttl).await;
        cache.set("user:1", "boards", &vec![1u64, 2], ttl).await;

        let projects: Option<Vec<String>> = cache.get("user:1", "projects").await;
        assert_eq!(projects, Some(vec!["ACME".to_string()]));

        cache.invalidate("user:1", Some("projects")).await;
        assert!(cache.get::<Vec<String>>("user:1", "projects").await.is_none());
        assert_eq!(cache.get::<Vec<u64>>("user:1", "boards").await, Some(vec![1, 2]));
    }

    #[tokio::test]
    async fn owner_wide_invalidate_spares_other_users() {
        let cache = cache();
        let ttl = cache.default_ttl();
        cache.set("user:1", "projects", &1, ttl).await;
        cache.set("user:1", "ACME:issues", &2, ttl).await;
        cache.set("user:2", "projects", &3, ttl).await;

        cache.invalidate("user:1", None).await;
        assert!(cache.get::<i32>("user:1", "projects").await.is_none());
        assert!(cache.get::<i32>("user:1", "ACME:issues").await.is_none());
        assert_eq!(cache.get::<i32>("user:2", "projects").await, Some(3));
    }

    #[tokio::test]
    async fn oversized_ttl_is_a_logged_miss() {
        let cache = cache();
        cache.set("user:1", "projects", &vec!["ACME"], Duration::MAX).await;
        assert!(cache.get::<Vec<String>>("user:1", "projects").await.is_none());
    }

    #[tokio::test]
    async fn wrong_shape_is_a_miss() {
        let cache = cache();
        cache
            .set("user:1", "projects", &"text", cache.default_ttl())
            .await;
        assert!(cache.get::<Vec<u64>>("user:1", "projects").await.is_none());
    }

    #[tokio::test]
    async fn last_refresh_is_recorded_per_project() {
        let cache = cache();
        let at = Utc::now();
        cache.record_refresh("user:1", "ACME", at).await;
        assert_eq!(cache.last_refresh("user:1", "ACME").await, Some(at));
        assert!(cache.last_refresh("user:1", "OTHER").await.is_none());

        cache.invalidate_project("user:1", "ACME").await;
        assert!(cache.last_refresh("user:1", "ACME").await.is_none());
    }

    #[tokio::test]
    async fn project_invalidate_clears_per_issue_entries() {
        let cache = cache();
        let ttl = cache.default_ttl();
        let per_issue = [
            keys::changelog_resource("ACME-1"),
            keys::issue_resource("ACME-1"),
            keys::worklogs_resource("ACME-2"),
        ];
        for resource in &per_issue {
            cache.set("user:1", resource, &1, ttl).await;
        }
        cache.set("user:1", &keys::changelog_resource("ACMEX-1"), &2, ttl).await;
        cache.set("user:1", &keys::projects_resource(), &3, ttl).await;
        cache.set("user:2", &keys::changelog_resource("ACME-1"), &4, ttl).await;

        cache.invalidate_project("user:1", "ACME").await;

        for resource in &per_issue {
            assert!(cache.get::<i32>("user:1", resource).await.is_none());
        }
        let other = keys::changelog_resource("ACMEX-1");
        assert_eq!(cache.get::<i32>("user:1", &other).await, Some(2));
        assert_eq!(cache.get::<i32>("user:1", &keys::projects_resource()).await, Some(3));
        let foreign = keys::changelog_resource("ACME-1");
        assert_eq!(cache.get::<i32>("user:2", &foreign).await, Some(4));
    }
}
