use thiserror::Error;

#[derive(Debug, Error)]
pub enum JiraError {
    #[error("Jira authentication failed, check the email and API token")]
    AuthenticationFailed,
    #[error("Jira denied access to this resource")]
    AuthorizationFailed,
    #[error("Jira rate limit exceeded after {attempts} attempts")]
    RateLimited {
        retry_after_secs: Option<u64>,
        attempts: u32,
    },
    #[error("cannot reach Jira: {0}")]
    TransientNetwork(String),
    #[error("Jira resource not found: {0}")]
    NotFound(String),
    #[error("Jira API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected Jira response from {path}: {message}")]
    Decode { path: String, message: String },
    #[error("no Jira field matches any of: {0}")]
    FieldNotFound(String),
    #[error("invalid Jira request: {0}")]
    InvalidRequest(String),
}

impl JiraError {
    /// 调用方可以稍后重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            JiraError::TransientNetwork(_) | JiraError::RateLimited { .. }
        )
    }

    /// 需要用户重新连接 Jira 的错误
    pub fn needs_reconnect(&self) -> bool {
        matches!(
            self,
            JiraError::AuthenticationFailed | JiraError::AuthorizationFailed
        )
    }
}

impl From<reqwest::Error> for JiraError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            JiraError::InvalidRequest(e.to_string())
        } else {
            JiraError::TransientNetwork(e.to_string())
        }
    }
}
