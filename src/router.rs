use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    middleware::{RateLimiter, auth_middleware, log_errors, rate_limit},
    routes,
};

// 公开路由
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/auth/register", post(routes::user::register))
        .route("/auth/login", post(routes::user::login))
}

// 需要登录的路由
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(routes::user::logout))
        .route("/auth/me", get(routes::user::me))
        // Jira 连接
        .route(
            "/jira/credentials",
            put(routes::jira::connect).delete(routes::jira::disconnect),
        )
        .route("/jira/projects", get(routes::jira::list_projects))
        .route("/jira/boards", get(routes::jira::list_boards))
        // 跟踪项目与仪表盘
        .route(
            "/projects",
            get(routes::project::list_tracked).put(routes::project::save_tracked),
        )
        .route("/dashboard/refresh", post(routes::dashboard::refresh))
        .route("/dashboard/{project}", post(routes::dashboard::project_dashboard))
        .route("/issues/{key}", get(routes::dashboard::issue_detail))
        .route("/issues/{key}/insights", get(routes::dashboard::issue_insights))
        .route("/issues/{key}/worklogs", get(routes::dashboard::issue_worklogs))
        // 团队成员
        .route("/team-members", get(routes::team::list_members))
        .route(
            "/team-members/{account_id}/labels",
            put(routes::team::set_labels),
        )
        // 个人设置
        .route(
            "/settings/ignored-tickets",
            get(routes::settings::ignored_tickets).post(routes::settings::ignore_ticket),
        )
        .route(
            "/settings/ignored-tickets/{key}",
            delete(routes::settings::unignore_ticket),
        )
        .route(
            "/settings/ignored-types",
            get(routes::settings::ignored_types).put(routes::settings::set_ignored_types),
        )
        // 管理员
        .route("/admin/users", get(routes::admin::list_users))
        .route("/admin/users/{id}/approve", post(routes::admin::approve_user))
        .route("/admin/users/{id}/reject", post(routes::admin::reject_user))
        .route("/admin/users/{id}", delete(routes::admin::delete_user))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
}

/// 组装完整的应用路由
pub fn create_router(state: AppState) -> Router {
    let rate_limiter = Arc::new(RateLimiter::new(state.cache.clone(), state.config.clone()));

    let api = Router::new()
        .merge(public_routes())
        .merge(protected_routes(&state));
    // axum 不允许在根路径上 nest
    let router = match state.config.api_base_uri.trim_end_matches('/') {
        "" => api,
        base => Router::new().nest(base, api),
    };

    // 添加日志中间件和限流中间件
    let router = router
        .layer(axum::middleware::from_fn(log_errors))
        .layer(axum::middleware::from_fn_with_state(rate_limiter, rate_limit))
        .layer(TraceLayer::new_for_http());

    // 开发环境允许所有来源
    #[cfg(debug_assertions)]
    let router = router.layer(tower_http::cors::CorsLayer::permissive());

    router.with_state(state)
}
