use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::SqlitePool;

use crate::cache::{CacheStore, DashboardCache, MemoryStore, RedisStore};
use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::infrastructure::TokenCipher;

pub mod aggregation;
pub mod cache;
pub mod config;
pub mod context;
pub mod credentials;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod infrastructure;
pub mod jira;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod utils;

/// 单次缓存操作的超时，超时按未命中处理
const CACHE_OP_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub cache: DashboardCache,
    pub credentials: CredentialStore,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config, cache: DashboardCache) -> anyhow::Result<Self> {
        let cipher = TokenCipher::from_base64(&config.encryption_key)
            .context("ENCRYPTION_KEY must be a base64 encoded 32 byte key")?;
        let http = build_http_client(&config)?;
        Ok(AppState {
            credentials: CredentialStore::new(pool.clone(), cipher),
            pool,
            config,
            cache,
            http,
        })
    }
}

/// 所有 Jira 客户端共用的连接池
pub fn build_http_client(config: &Config) -> anyhow::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.jira_timeout())
        .user_agent(concat!("jira-dashboard/", env!("CARGO_PKG_VERSION")));
    if let Some(proxy) = &config.proxy_url {
        builder = builder.proxy(reqwest::Proxy::all(proxy).context("invalid PROXY_URL")?);
    }
    builder.build().context("failed to build HTTP client")
}

/// 配置了 REDIS_URL 时使用 Redis，否则使用进程内存储
pub fn build_cache(config: &Config) -> anyhow::Result<DashboardCache> {
    let store: Arc<dyn CacheStore> = match &config.redis_url {
        Some(url) => {
            tracing::info!("Using Redis cache store");
            Arc::new(RedisStore::new(url, CACHE_OP_TIMEOUT).context("invalid REDIS_URL")?)
        }
        None => {
            tracing::info!("REDIS_URL not set, using in-memory cache store");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(DashboardCache::new(store, config.cache_ttl()))
}
