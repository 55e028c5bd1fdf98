use crate::AppState;
use crate::cache::keys;
use crate::database::UserRole;
use crate::error::AppError;
use crate::jira::JiraClient;

/// 认证中间件写入请求扩展的调用者信息
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
    /// 当前会话ID的摘要，注销时使用
    pub session_hash: String,
}

impl RequestContext {
    pub fn owner_key(&self) -> String {
        keys::owner_key(self.user_id)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("需要管理员权限".into()))
        }
    }

    /// 按需解密凭证并构造 Jira 客户端，令牌不会离开客户端
    pub async fn jira_client(&self, state: &AppState) -> Result<JiraClient, AppError> {
        let credential = state
            .credentials
            .retrieve(self.user_id)
            .await?
            .ok_or(AppError::JiraNotConnected)?;
        Ok(JiraClient::new(
            state.http.clone(),
            &credential.base_url,
            &credential.email,
            credential.token,
            state.config.jira_retry_policy(),
        ))
    }
}
