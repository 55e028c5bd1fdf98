use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credentials::JiraConnection;
use crate::database::{UserEntity, UserRole, UserStatus};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl From<UserEntity> for UserProfile {
    fn from(user: UserEntity) -> Self {
        UserProfile {
            id: user.id,
            email: user.email,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserProfile,
    /// 是否需要等待管理员审批
    pub requires_approval: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: i64,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
    pub jira: Option<JiraConnection>,
}

/// 邮箱必须属于允许的域名
pub fn validate_email(email: &str, allowed_domain: &str) -> Result<(), String> {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return Err("邮箱格式无效".into());
    };
    if local.is_empty() || local.contains(char::is_whitespace) {
        return Err("邮箱格式无效".into());
    }
    if !domain.eq_ignore_ascii_case(allowed_domain) {
        return Err(format!("只允许使用 @{} 邮箱注册", allowed_domain));
    }
    Ok(())
}

/// 8 到 128 个字符，至少一个大写字母和一个数字
pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(format!(
            "密码长度必须在{}到{}个字符之间",
            MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("密码必须包含至少一个大写字母".into());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("密码必须包含至少一个数字".into());
    }
    Ok(())
}
