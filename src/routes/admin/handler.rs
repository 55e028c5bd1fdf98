use axum::extract::{Extension, Json, Path, Query, State};

use crate::{
    AppState,
    cache::keys,
    context::RequestContext,
    database::{SessionRepository, UserRepository, UserStatus},
    error::AppError,
    routes::user::UserProfile,
    utils::{ApiResponse, success_to_api_response},
};

use super::model::UserListQuery;

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Vec<UserProfile>>>, AppError> {
    ctx.require_admin()?;
    let users = UserRepository::list(&state.pool, query.status).await?;
    Ok(success_to_api_response(
        users.into_iter().map(UserProfile::from).collect(),
    ))
}

#[axum::debug_handler]
pub async fn approve_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    ctx.require_admin()?;
    let user = UserRepository::set_status(&state.pool, user_id, UserStatus::Approved)
        .await?
        .ok_or_else(|| AppError::NotFound("用户不存在".into()))?;
    tracing::info!("Admin {} approved user {}", ctx.user_id, user_id);
    Ok(success_to_api_response(user.into()))
}

/// 拒绝后立即吊销该用户的全部会话
#[axum::debug_handler]
pub async fn reject_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    ctx.require_admin()?;
    if user_id == ctx.user_id {
        return Err(AppError::Validation("不能拒绝自己的账户".into()));
    }
    let user = UserRepository::set_status(&state.pool, user_id, UserStatus::Rejected)
        .await?
        .ok_or_else(|| AppError::NotFound("用户不存在".into()))?;
    SessionRepository::delete_for_user(&state.pool, user_id).await?;
    tracing::info!("Admin {} rejected user {}", ctx.user_id, user_id);
    Ok(success_to_api_response(user.into()))
}

/// 删除账户，凭证随外键级联删除，缓存单独清理
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    ctx.require_admin()?;
    if user_id == ctx.user_id {
        return Err(AppError::Validation("不能删除自己的账户".into()));
    }
    if !UserRepository::delete(&state.pool, user_id).await? {
        return Err(AppError::NotFound("用户不存在".into()));
    }
    state.cache.invalidate(&keys::owner_key(user_id), None).await;
    tracing::info!("Admin {} deleted user {}", ctx.user_id, user_id);
    Ok(success_to_api_response(true))
}
