use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::error::JiraError;
use super::fields::resolve_field;
use super::types::{
    ApiIssue, BoardConfiguration, BoardIssuePage, ChangelogEntry, ErrorBody, JiraBoard, JiraField,
    JiraProject, JiraSprint, JiraUser, PagedValues, SearchPage, Worklog, WorklogPage,
};
use crate::infrastructure::ApiToken;

const PAGE_SIZE: u64 = 50;
const SEARCH_PAGE_SIZE: usize = 100;

/// 限流重试策略
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// 至少两次，保证被限流的请求一定会重试一次
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(2)
    }

    /// 第 n 次（从0开始）重试前的等待时间
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let base = retry_after.unwrap_or(self.base_delay);
        let factor = 2u32.saturating_pow(attempt);
        base.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct JiraClient {
    http: Client,
    base_url: String,
    email: String,
    token: ApiToken,
    retry: RetryPolicy,
}

impl JiraClient {
    pub fn new(
        http: Client,
        base_url: &str,
        email: &str,
        token: ApiToken,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
            token,
            retry,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, JiraError> {
        self.execute(Method::GET, path, query, None).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, JiraError> {
        let url = format!("{}{}", self.base_url, path);
        let attempts = self.retry.attempts();

        for attempt in 0..attempts {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .basic_auth(&self.email, Some(self.token.expose()))
                .header(ACCEPT, "application/json");
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!("Jira {} {} (attempt {})", method, path, attempt + 1);
            let response = request.send().await?;
            let status = response.status();

            if status.is_success() {
                let bytes = response.bytes().await?;
                return serde_json::from_slice(&bytes).map_err(|e| JiraError::Decode {
                    path: path.to_string(),
                    message: e.to_string(),
                });
            }

            match status {
                StatusCode::UNAUTHORIZED => {
                    warn!("Jira authentication failed for {}", path);
                    return Err(JiraError::AuthenticationFailed);
                }
                StatusCode::FORBIDDEN => {
                    warn!("Jira denied access to {}", path);
                    return Err(JiraError::AuthorizationFailed);
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = parse_retry_after(response.headers());
                    if attempt + 1 < attempts {
                        let wait = self.retry.delay_for(attempt, retry_after);
                        warn!(
                            "Jira rate limit hit on {}, retrying in {:?} (attempt {})",
                            path,
                            wait,
                            attempt + 1
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    return Err(JiraError::RateLimited {
                        retry_after_secs: retry_after.map(|d| d.as_secs()),
                        attempts,
                    });
                }
                StatusCode::NOT_FOUND => return Err(JiraError::NotFound(path.to_string())),
                _ => {
                    let text = response.text().await.unwrap_or_default();
                    let message = serde_json::from_str::<ErrorBody>(&text)
                        .ok()
                        .and_then(|b| b.summary())
                        .unwrap_or_else(|| text.chars().take(200).collect());
                    return Err(JiraError::Api {
                        status: status.as_u16(),
                        message,
                    });
                }
            }
        }

        Err(JiraError::RateLimited {
            retry_after_secs: None,
            attempts,
        })
    }

    /// 校验凭证并返回当前 Jira 用户
    pub async fn myself(&self) -> Result<JiraUser, JiraError> {
        self.get("/rest/api/3/myself", &[]).await
    }

    pub async fn list_projects(&self) -> Result<Vec<JiraProject>, JiraError> {
        self.drain_values("/rest/api/3/project/search", Vec::new())
            .await
    }

    pub async fn list_boards(&self, project_key: Option<&str>) -> Result<Vec<JiraBoard>, JiraError> {
        let filter = project_key
            .map(|key| vec![("projectKeyOrId", key.to_string())])
            .unwrap_or_default();
        self.drain_values("/rest/agile/1.0/board", filter).await
    }

    pub async fn board_configuration(&self, board_id: u64) -> Result<BoardConfiguration, JiraError> {
        self.get(&format!("/rest/agile/1.0/board/{board_id}/configuration"), &[])
            .await
    }

    pub async fn list_sprints(
        &self,
        board_id: u64,
        state: Option<&str>,
    ) -> Result<Vec<JiraSprint>, JiraError> {
        let filter = state
            .map(|s| vec![("state", s.to_string())])
            .unwrap_or_default();
        self.drain_values(&format!("/rest/agile/1.0/board/{board_id}/sprint"), filter)
            .await
    }

    /// 看板上的全部工单，按 startAt/total 分页
    pub async fn board_issues(
        &self,
        board_id: u64,
        jql: Option<&str>,
        fields: &[String],
    ) -> Result<Vec<ApiIssue>, JiraError> {
        let path = format!("/rest/agile/1.0/board/{board_id}/issue");
        let mut issues = Vec::new();
        let mut start_at = 0u64;

        loop {
            let mut query = vec![
                ("startAt", start_at.to_string()),
                ("maxResults", SEARCH_PAGE_SIZE.to_string()),
                ("fields", fields.join(",")),
            ];
            if let Some(jql) = jql {
                query.push(("jql", jql.to_string()));
            }

            let page: BoardIssuePage = self.get(&path, &query).await?;
            let received = page.issues.len() as u64;
            issues.extend(page.issues);

            if received == 0 || issues.len() as u64 >= page.total {
                break;
            }
            start_at += received;
        }

        Ok(issues)
    }

    /// JQL 搜索，按 nextPageToken 分页，结果截断到 `max_results`
    pub async fn search_issues(
        &self,
        jql: &str,
        fields: &[String],
        max_results: usize,
    ) -> Result<Vec<ApiIssue>, JiraError> {
        let mut issues: Vec<ApiIssue> = Vec::new();
        let mut next_page_token: Option<String> = None;

        while issues.len() < max_results {
            let mut body = json!({
                "jql": jql,
                "fields": fields,
                "maxResults": (max_results - issues.len()).min(SEARCH_PAGE_SIZE),
            });
            if let Some(token) = &next_page_token {
                body["nextPageToken"] = Value::String(token.clone());
            }

            let page: SearchPage = self
                .execute(Method::POST, "/rest/api/3/search/jql", &[], Some(&body))
                .await?;
            issues.extend(page.issues);

            match page.next_page_token {
                Some(token) if !token.is_empty() => next_page_token = Some(token),
                _ => break,
            }
        }

        issues.truncate(max_results);
        Ok(issues)
    }

    /// 单个工单，`fields` 为空时由 Jira 返回默认字段
    pub async fn issue(&self, issue_key: &str, fields: &[String]) -> Result<ApiIssue, JiraError> {
        let query = if fields.is_empty() {
            Vec::new()
        } else {
            vec![("fields", fields.join(","))]
        };
        self.get(&format!("/rest/api/3/issue/{issue_key}"), &query)
            .await
    }

    /// 工单的全部工时记录，按 startAt/total 分页
    pub async fn issue_worklogs(&self, issue_key: &str) -> Result<Vec<Worklog>, JiraError> {
        let path = format!("/rest/api/3/issue/{issue_key}/worklog");
        let mut worklogs = Vec::new();
        let mut start_at = 0u64;

        loop {
            let query = [
                ("startAt", start_at.to_string()),
                ("maxResults", SEARCH_PAGE_SIZE.to_string()),
            ];
            let page: WorklogPage = self.get(&path, &query).await?;
            let received = page.worklogs.len() as u64;
            worklogs.extend(page.worklogs);

            if received == 0 || worklogs.len() as u64 >= page.total {
                break;
            }
            start_at += received;
        }

        Ok(worklogs)
    }

    pub async fn issue_changelog(&self, issue_key: &str) -> Result<Vec<ChangelogEntry>, JiraError> {
        let path = format!("/rest/api/3/issue/{issue_key}/changelog");
        let mut entries = Vec::new();
        let mut start_at = 0u64;

        loop {
            let query = [
                ("startAt", start_at.to_string()),
                ("maxResults", SEARCH_PAGE_SIZE.to_string()),
            ];
            let page: PagedValues<ChangelogEntry> = self.get(&path, &query).await?;
            let received = page.values.len() as u64;
            entries.extend(page.values);

            let exhausted = page.total.is_some_and(|t| entries.len() as u64 >= t);
            if page.is_last || received == 0 || exhausted {
                break;
            }
            start_at += received;
        }

        Ok(entries)
    }

    pub async fn list_fields(&self) -> Result<Vec<JiraField>, JiraError> {
        self.get("/rest/api/3/field", &[]).await
    }

    /// 返回第一个匹配候选名称的字段，找不到时返回 `FieldNotFound`
    pub async fn discover_field(&self, candidates: &[String]) -> Result<JiraField, JiraError> {
        let fields = self.list_fields().await?;
        resolve_field(&fields, candidates)
            .cloned()
            .ok_or_else(|| JiraError::FieldNotFound(candidates.join(", ")))
    }

    pub async fn project_members(&self, project_key: &str) -> Result<Vec<JiraUser>, JiraError> {
        let query = [
            ("project", project_key.to_string()),
            ("maxResults", "1000".to_string()),
        ];
        self.get("/rest/api/3/user/assignable/search", &query).await
    }

    // startAt/maxResults/isLast 分页的通用读取
    async fn drain_values<T: DeserializeOwned>(
        &self,
        path: &str,
        filter: Vec<(&str, String)>,
    ) -> Result<Vec<T>, JiraError> {
        let mut out = Vec::new();
        let mut start_at = 0u64;

        loop {
            let mut query = filter.clone();
            query.push(("startAt", start_at.to_string()));
            query.push(("maxResults", PAGE_SIZE.to_string()));

            let page: PagedValues<T> = self.get(path, &query).await?;
            let received = page.values.len() as u64;
            out.extend(page.values);

            if page.is_last || received == 0 {
                break;
            }
            start_at += received;
        }

        Ok(out)
    }
}

/// 只支持秒数形式的 Retry-After
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(policy.delay_for(0, None), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1, None), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2, None), Duration::from_millis(350));
        assert_eq!(policy.delay_for(40, None), Duration::from_millis(350));
    }

    #[test]
    fn retry_after_header_overrides_base() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_for(1, Some(Duration::from_secs(2))),
            Duration::from_secs(4)
        );
    }

    #[test]
    fn at_least_two_attempts() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.attempts(), 2);
    }

    #[test]
    fn retry_after_parses_seconds_only() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, "7".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert(RETRY_AFTER, "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), None);
    }
}
