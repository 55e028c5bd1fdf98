use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::aggregation::ValidationError;
use crate::credentials::CredentialError;
use crate::jira::JiraError;
use crate::utils::{error_codes, error_to_api_response};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("未授权访问")]
    Unauthorized,
    #[error("邮箱或密码错误")]
    InvalidCredentials,
    #[error("账户尚未通过审批")]
    NotApproved,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("尚未连接 Jira 账户")]
    JiraNotConnected,
    #[error(transparent)]
    Jira(#[from] JiraError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, i32, String) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                error_codes::VALIDATION_ERROR,
                format!("参数错误: {}", msg),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTH_FAILED,
                "未授权访问".into(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTH_FAILED,
                "邮箱或密码错误".into(),
            ),
            AppError::NotApproved => (
                StatusCode::FORBIDDEN,
                error_codes::ACCOUNT_NOT_APPROVED,
                "账户尚未通过审批".into(),
            ),
            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                error_codes::PERMISSION_DENIED,
                msg.clone(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, error_codes::USER_EXISTS, msg.clone()),
            AppError::JiraNotConnected => (
                StatusCode::CONFLICT,
                error_codes::JIRA_NOT_CONNECTED,
                "尚未连接 Jira 账户，请先完成连接".into(),
            ),
            AppError::Jira(e) => jira_parts(e),
            AppError::Credential(CredentialError::InvalidBaseUrl) => (
                StatusCode::BAD_REQUEST,
                error_codes::VALIDATION_ERROR,
                "Jira 地址必须以 https:// 开头".into(),
            ),
            AppError::Credential(CredentialError::Blank(field)) => (
                StatusCode::BAD_REQUEST,
                error_codes::VALIDATION_ERROR,
                format!("{} 不能为空", field),
            ),
            AppError::Credential(CredentialError::Crypto(_)) => (
                StatusCode::CONFLICT,
                error_codes::JIRA_NOT_CONNECTED,
                "无法解密已保存的 Jira 凭证，请重新连接".into(),
            ),
            AppError::Credential(CredentialError::Database(_))
            | AppError::Database(_)
            | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "内部服务器错误".into(),
            ),
        }
    }
}

fn jira_parts(e: &JiraError) -> (StatusCode, i32, String) {
    match e {
        JiraError::AuthenticationFailed => (
            StatusCode::UNAUTHORIZED,
            error_codes::JIRA_AUTH_FAILED,
            "Jira 认证失败，请检查 API 令牌后重新连接".into(),
        ),
        JiraError::AuthorizationFailed => (
            StatusCode::FORBIDDEN,
            error_codes::JIRA_FORBIDDEN,
            "Jira 拒绝访问该资源，请确认账户权限或重新连接".into(),
        ),
        JiraError::RateLimited {
            retry_after_secs, ..
        } => (
            StatusCode::TOO_MANY_REQUESTS,
            error_codes::JIRA_RATE_LIMITED,
            match retry_after_secs {
                Some(secs) => format!("Jira 请求过于频繁，请在{}秒后重试", secs),
                None => "Jira 请求过于频繁，请稍后重试".into(),
            },
        ),
        JiraError::TransientNetwork(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::JIRA_UNAVAILABLE,
            "暂时无法连接 Jira，请稍后重试".into(),
        ),
        JiraError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            error_codes::NOT_FOUND,
            "Jira 中不存在该资源".into(),
        ),
        JiraError::InvalidRequest(_) => (
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            "Jira 请求参数无效".into(),
        ),
        JiraError::FieldNotFound(candidates) => (
            StatusCode::BAD_GATEWAY,
            error_codes::JIRA_UNAVAILABLE,
            format!("Jira 中找不到字段: {}", candidates),
        ),
        JiraError::Api { .. } | JiraError::Decode { .. } => (
            StatusCode::BAD_GATEWAY,
            error_codes::JIRA_UNAVAILABLE,
            "Jira 返回了无法处理的响应".into(),
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, msg) = self.parts();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, error_to_api_response::<()>(code, msg)).into_response()
    }
}
