use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    cache::DashboardCache,
    config::Config,
    utils::{error_codes, error_to_api_response},
};

/// 按客户端 IP 的固定窗口限流，计数存储不可用时放行
#[derive(Clone)]
pub struct RateLimiter {
    cache: DashboardCache,
    config: Arc<Config>,
}

impl RateLimiter {
    pub fn new(cache: DashboardCache, config: Config) -> Self {
        Self {
            cache,
            config: Arc::new(config),
        }
    }

    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        // 从连接信息获取原始IP
        let remote_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string());
        let ip = client_ip(req.headers(), remote_ip.as_deref());

        let window = self.config.rate_limit_window();
        let Some(count) = self.cache.hit_counter(&ip, window).await else {
            return next.run(req).await;
        };

        if count > u64::from(self.config.rate_limit_requests) {
            tracing::warn!("Rate limit exceeded for {}", ip);
            return (
                StatusCode::TOO_MANY_REQUESTS,
                error_to_api_response::<()>(
                    error_codes::RATE_LIMIT,
                    format!("请求过于频繁，请在{}秒后重试", window.as_secs()),
                ),
            )
                .into_response();
        }

        next.run(req).await
    }
}

/// 优先使用代理头，其次是连接地址
fn client_ip(headers: &HeaderMap, remote_ip: Option<&str>) -> String {
    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip) // 降级使用连接IP
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}
