use axum::extract::{Extension, Json, State};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState,
    context::RequestContext,
    database::{SessionRepository, UserRepository, UserRole, UserStatus},
    error::AppError,
    utils::{
        ApiResponse, generate_token, hash_password, hash_session_id, success_to_api_response,
        verify_password,
    },
};

use super::model::{
    LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse, UserProfile,
    validate_email, validate_password,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<RegisterResponse>>, AppError> {
    let email = req.email.trim().to_lowercase();
    validate_email(&email, &state.config.allowed_email_domain).map_err(AppError::Validation)?;
    validate_password(&req.password).map_err(AppError::Validation)?;

    if UserRepository::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Conflict("用户已存在".into()));
    }

    // 配置的管理员邮箱直接通过审批
    let (role, status) = if email == state.config.admin_email {
        (UserRole::Admin, UserStatus::Approved)
    } else {
        (UserRole::User, UserStatus::Pending)
    };

    let password_hash =
        hash_password(&req.password).map_err(|e| AppError::Internal(e.to_string()))?;
    let user = UserRepository::create(&state.pool, &email, &password_hash, role, status)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("用户已存在".into())
            }
            other => AppError::Database(other),
        })?;

    tracing::info!("Registered user {} as {:?}/{:?}", user.id, role, status);
    Ok(success_to_api_response(RegisterResponse {
        requires_approval: status == UserStatus::Pending,
        user: user.into(),
    }))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let email = req.email.trim().to_lowercase();
    let user = UserRepository::find_by_email(&state.pool, &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid = verify_password(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    match user.status {
        UserStatus::Approved => {}
        UserStatus::Pending => return Err(AppError::NotApproved),
        UserStatus::Rejected => return Err(AppError::Forbidden("账户申请已被拒绝".into())),
    }

    let session_id = Uuid::new_v4().to_string();
    let (token, expires_at) = generate_token(user.id, &session_id, &state.config)
        .map_err(|e| AppError::Internal(format!("生成令牌失败: {}", e)))?;
    SessionRepository::create(&state.pool, &hash_session_id(&session_id), user.id, expires_at)
        .await?;

    tracing::info!("User {} logged in", user.id);
    Ok(success_to_api_response(LoginResponse {
        token,
        expires_at,
        user: user.into(),
    }))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    let removed = SessionRepository::delete_by_token_hash(&state.pool, &ctx.session_hash).await?;
    // 顺带清理过期会话
    let purged = SessionRepository::cleanup_expired(&state.pool, Utc::now().timestamp()).await?;
    if purged > 0 {
        tracing::debug!("Purged {} expired sessions", purged);
    }
    Ok(success_to_api_response(removed))
}

#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ApiResponse<MeResponse>>, AppError> {
    let user = UserRepository::find_by_id(&state.pool, ctx.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    let jira = state.credentials.connection(ctx.user_id).await?;
    Ok(success_to_api_response(MeResponse {
        user: UserProfile::from(user),
        jira,
    }))
}
