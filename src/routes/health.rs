use axum::extract::{Json, State};
use serde::Serialize;

use crate::{
    AppState,
    utils::{ApiResponse, success_to_api_response},
};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: bool,
}

/// 健康检查，数据库不可用时返回 degraded
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => true,
        Err(e) => {
            tracing::error!("Health check database probe failed: {}", e);
            false
        }
    };
    success_to_api_response(HealthStatus {
        status: if database { "ok" } else { "degraded" },
        database,
    })
}
