use axum::Json;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::Config;

/// 通用的API响应结构
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// 错误码，0表示成功，非0表示失败
    pub code: i32,
    /// 错误消息，成功时为"success"
    pub msg: String,
    /// 响应数据，错误时为None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resp_data: Option<T>,
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 用户ID
    pub sid: String, // 会话ID，数据库只保存其摘要
    pub exp: i64,    // 过期时间
    pub iat: i64,    // 签发时间
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

pub fn generate_token(
    user_id: i64,
    session_id: &str,
    config: &Config,
) -> Result<(String, i64), jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let expiration = now + config.session_expiration().as_secs() as i64;

    let claims = Claims {
        sub: user_id.to_string(),
        sid: session_id.to_string(),
        exp: expiration,
        iat: now,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;

    Ok((token, expiration))
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// 会话ID的 SHA-256 十六进制摘要
pub fn hash_session_id(session_id: &str) -> String {
    Sha256::digest(session_id.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Jira 项目键：字母开头，只含大写字母、数字和下划线
pub fn is_valid_project_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Jira 工单键，如 `ACME-42`
pub fn is_valid_issue_key(key: &str) -> bool {
    match key.rsplit_once('-') {
        Some((project, number)) => {
            is_valid_project_key(project)
                && !number.is_empty()
                && number.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: error_codes::SUCCESS,
        msg: "success".into(),
        resp_data: Some(data),
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        resp_data: None,
    })
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const USER_EXISTS: i32 = 1001;
    pub const AUTH_FAILED: i32 = 1002;
    pub const PERMISSION_DENIED: i32 = 1003;
    pub const NOT_FOUND: i32 = 1004;
    pub const RATE_LIMIT: i32 = 1005;
    pub const ACCOUNT_NOT_APPROVED: i32 = 1006;
    pub const JIRA_AUTH_FAILED: i32 = 2001;
    pub const JIRA_FORBIDDEN: i32 = 2002;
    pub const JIRA_RATE_LIMITED: i32 = 2003;
    pub const JIRA_UNAVAILABLE: i32 = 2004;
    pub const JIRA_NOT_CONNECTED: i32 = 2005;
    pub const INTERNAL_ERROR: i32 = 5000;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_lookup(|key| {
            match key {
                "DATABASE_URL" => Some("sqlite::memory:"),
                "JWT_SECRET" => Some("unit-test-secret"),
                "ENCRYPTION_KEY" => Some("BwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwc="),
                "ADMIN_EMAIL" => Some("lead@example.com"),
                "ALLOWED_EMAIL_DOMAIN" => Some("example.com"),
                _ => None,
            }
            .map(str::to_string)
        })
        .unwrap()
    }

    #[test]
    fn token_carries_user_and_session() {
        let config = config();
        let (token, exp) = generate_token(42, "session-1", &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.sid, "session-1");
        assert_eq!(claims.exp, exp);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let config = config();
        let mut other = config.clone();
        other.jwt_secret = "another-secret".into();
        let (token, _) = generate_token(1, "s", &other).unwrap();
        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn jira_keys_are_validated() {
        assert!(is_valid_project_key("ACME"));
        assert!(is_valid_project_key("A1_B"));
        assert!(!is_valid_project_key("acme"));
        assert!(!is_valid_project_key("1ACME"));
        assert!(!is_valid_project_key("AC ME\" OR 1=1"));
        assert!(is_valid_issue_key("ACME-42"));
        assert!(!is_valid_issue_key("ACME-"));
        assert!(!is_valid_issue_key("ACME42"));
        assert!(!is_valid_issue_key("../ACME-1"));
    }

    #[test]
    fn session_hash_is_stable_hex() {
        let a = hash_session_id("abc");
        assert_eq!(a.len(), 64);
        assert_eq!(a, hash_session_id("abc"));
        assert_ne!(a, hash_session_id("abd"));
    }
}
