use std::net::{IpAddr, SocketAddr};

use anyhow::Context;
use chrono::Utc;
use jira_dashboard::{
    AppState, build_cache,
    config::Config,
    database::{self, SessionRepository},
    router::create_router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!("Loaded configuration: {:?}", config);

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 连接数据库并执行迁移
    let pool = database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    let purged = SessionRepository::cleanup_expired(&pool, Utc::now().timestamp()).await?;
    if purged > 0 {
        tracing::info!("Removed {} expired sessions", purged);
    }

    let cache = build_cache(&config)?;
    let state = AppState::new(pool, config, cache)?;

    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    let app = create_router(state);

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind")?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Failed to start server")?;
    Ok(())
}
