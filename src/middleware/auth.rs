use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::Utc;

use crate::{
    AppState,
    context::RequestContext,
    database::{SessionRepository, UserRepository},
    error::AppError,
    utils::{hash_session_id, verify_token},
};

/// 校验 JWT、会话和用户状态，通过后把 `RequestContext` 放入请求扩展
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::Unauthorized)?;

    let claims = verify_token(bearer.token(), &state.config).map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        AppError::Unauthorized
    })?;
    let user_id = claims.user_id().ok_or(AppError::Unauthorized)?;

    let session_hash = hash_session_id(&claims.sid);
    let session = SessionRepository::find_valid(&state.pool, &session_hash, Utc::now().timestamp())
        .await?
        .ok_or(AppError::Unauthorized)?;
    if session.user_id != user_id {
        return Err(AppError::Unauthorized);
    }

    let user = UserRepository::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !user.is_approved() {
        return Err(AppError::NotApproved);
    }

    req.extensions_mut().insert(RequestContext {
        user_id: user.id,
        email: user.email,
        role: user.role,
        session_hash,
    });
    Ok(next.run(req).await)
}
