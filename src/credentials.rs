//! Jira 凭证存储：写入前加密，读取时按需解密

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::database::CredentialRepository;
use crate::infrastructure::{ApiToken, CryptoError, TokenCipher};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Jira base URL must start with https://")]
    InvalidBaseUrl,
    #[error("{0} must not be empty")]
    Blank(&'static str),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// 连接 Jira 时从 `/myself` 得到的账户信息
#[derive(Debug, Clone, Default)]
pub struct JiraProfile {
    pub display_name: Option<String>,
    pub account_id: Option<String>,
}

/// 解密后的凭证，只用于构造 Jira 客户端
#[derive(Debug, Clone)]
pub struct StoredCredential {
    pub base_url: String,
    pub email: String,
    pub token: ApiToken,
}

/// 可以返回给前端的连接信息，不含令牌
#[derive(Debug, Clone, Serialize)]
pub struct JiraConnection {
    pub base_url: String,
    pub email: String,
    pub display_name: Option<String>,
    pub account_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
    cipher: Arc<TokenCipher>,
}

impl CredentialStore {
    pub fn new(pool: SqlitePool, cipher: TokenCipher) -> Self {
        Self {
            pool,
            cipher: Arc::new(cipher),
        }
    }

    /// 加密令牌后覆盖该用户原有的凭证
    pub async fn store(
        &self,
        user_id: i64,
        base_url: &str,
        email: &str,
        token: &ApiToken,
        profile: &JiraProfile,
    ) -> Result<(), CredentialError> {
        let base_url = normalize_base_url(base_url)?;
        let email = email.trim();
        if email.is_empty() {
            return Err(CredentialError::Blank("email"));
        }
        if token.is_blank() {
            return Err(CredentialError::Blank("api_token"));
        }

        let encrypted = self.cipher.encrypt(token)?;
        CredentialRepository::upsert(
            &self.pool,
            user_id,
            &base_url,
            email,
            &encrypted,
            profile.display_name.as_deref(),
            profile.account_id.as_deref(),
        )
        .await?;
        tracing::info!("Stored Jira credential for user {}", user_id);
        Ok(())
    }

    pub async fn retrieve(&self, user_id: i64) -> Result<Option<StoredCredential>, CredentialError> {
        let Some(entity) = CredentialRepository::find(&self.pool, user_id).await? else {
            return Ok(None);
        };
        let token = self.cipher.decrypt(&entity.encrypted_token)?;
        Ok(Some(StoredCredential {
            base_url: entity.base_url,
            email: entity.email,
            token,
        }))
    }

    pub async fn connection(&self, user_id: i64) -> Result<Option<JiraConnection>, CredentialError> {
        let entity = CredentialRepository::find(&self.pool, user_id).await?;
        Ok(entity.map(|e| JiraConnection {
            base_url: e.base_url,
            email: e.email,
            display_name: e.jira_display_name,
            account_id: e.jira_account_id,
            updated_at: e.updated_at,
        }))
    }

    pub async fn remove(&self, user_id: i64) -> Result<bool, CredentialError> {
        Ok(CredentialRepository::delete(&self.pool, user_id).await?)
    }
}

/// 只接受 https，去掉末尾的 `/`
pub fn normalize_base_url(raw: &str) -> Result<String, CredentialError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("https://")
        .ok_or(CredentialError::InvalidBaseUrl)?;
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return Err(CredentialError::InvalidBaseUrl);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(
            normalize_base_url(" https://acme.atlassian.net/ ").unwrap(),
            "https://acme.atlassian.net"
        );
        assert!(normalize_base_url("http://acme.atlassian.net").is_err());
        assert!(normalize_base_url("https://").is_err());
        assert!(normalize_base_url("acme.atlassian.net").is_err());
    }
}
