use std::env;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::jira::RetryPolicy;

const DEFAULT_STORY_POINT_FIELDS: &[&str] = &["Story Points", "Story point estimate"];
const DEFAULT_SPRINT_FIELDS: &[&str] = &["Sprint"];
const DEFAULT_TEAM_FIELDS: &[&str] = &["Team"];
const DEFAULT_TERMINAL_STATUSES: &[&str] = &["Done", "Closed", "Resolved"];
const DEFAULT_IN_PROGRESS_STATUSES: &[&str] = &["In Progress", "In Review", "In Development"];

// 时长类配置的取值范围
const SESSION_HOURS: RangeInclusive<u64> = 1..=24 * 365;
const CACHE_TTL_SECS: RangeInclusive<u64> = 1..=30 * 24 * 3600;
const RATE_LIMIT_WINDOW_SECS: RangeInclusive<u64> = 1..=24 * 3600;
const JIRA_TIMEOUT_SECS: RangeInclusive<u64> = 1..=600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub session_expiration_secs: u64,
    pub encryption_key: String,
    pub admin_email: String,
    pub allowed_email_domain: String,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub cache_ttl_secs: u64,
    pub jira_max_attempts: u32,
    pub jira_backoff_base_ms: u64,
    pub jira_backoff_max_ms: u64,
    pub jira_timeout_secs: u64,
    pub proxy_url: Option<String>,
    pub story_point_fields: Vec<String>,
    pub sprint_fields: Vec<String>,
    pub team_fields: Vec<String>,
    pub terminal_statuses: Vec<String>,
    pub in_progress_statuses: Vec<String>,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源解析配置，`from_env` 只是其中一种来源
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| value(key).ok_or(ConfigError::Missing(key));

        // 与 JWT_EXPIRATION 一样允许 "72h" 这种写法
        let session_hours = value("SESSION_EXPIRATION").map(|v| v.trim_end_matches('h').to_string());
        let session_hours = parse_in("SESSION_EXPIRATION", session_hours, 72, SESSION_HOURS)?;

        let admin_email = required("ADMIN_EMAIL")?.to_lowercase();
        let allowed_email_domain = value("ALLOWED_EMAIL_DOMAIN")
            .map(|d| d.trim_start_matches('@').to_lowercase())
            .ok_or(ConfigError::Missing("ALLOWED_EMAIL_DOMAIN"))?;

        let mut api_base_uri = value("API_BASE_URI").unwrap_or_else(|| "/api".to_string());
        if !api_base_uri.starts_with('/') {
            api_base_uri.insert(0, '/');
        }

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            redis_url: value("REDIS_URL"),
            jwt_secret: required("JWT_SECRET")?,
            session_expiration_secs: session_hours * 3600,
            encryption_key: required("ENCRYPTION_KEY")?,
            admin_email,
            allowed_email_domain,
            server_host: value("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: parse_or("SERVER_PORT", value("SERVER_PORT"), 3000)?,
            api_base_uri,
            cache_ttl_secs: parse_in("CACHE_TTL", value("CACHE_TTL"), 900, CACHE_TTL_SECS)?,
            jira_max_attempts: parse_or("JIRA_MAX_ATTEMPTS", value("JIRA_MAX_ATTEMPTS"), 3)?,
            jira_backoff_base_ms: parse_or(
                "JIRA_BACKOFF_BASE_MS",
                value("JIRA_BACKOFF_BASE_MS"),
                1000,
            )?,
            jira_backoff_max_ms: parse_or(
                "JIRA_BACKOFF_MAX_MS",
                value("JIRA_BACKOFF_MAX_MS"),
                60_000,
            )?,
            jira_timeout_secs: parse_in(
                "JIRA_TIMEOUT",
                value("JIRA_TIMEOUT"),
                30,
                JIRA_TIMEOUT_SECS,
            )?,
            proxy_url: value("PROXY_URL"),
            story_point_fields: split_list(
                value("JIRA_STORY_POINT_FIELDS"),
                DEFAULT_STORY_POINT_FIELDS,
            ),
            sprint_fields: split_list(value("JIRA_SPRINT_FIELDS"), DEFAULT_SPRINT_FIELDS),
            team_fields: split_list(value("JIRA_TEAM_FIELDS"), DEFAULT_TEAM_FIELDS),
            terminal_statuses: split_list(value("TERMINAL_STATUSES"), DEFAULT_TERMINAL_STATUSES),
            in_progress_statuses: split_list(
                value("IN_PROGRESS_STATUSES"),
                DEFAULT_IN_PROGRESS_STATUSES,
            ),
            rate_limit_window_secs: parse_in(
                "RATE_LIMIT_WINDOW",
                value("RATE_LIMIT_WINDOW"),
                60,
                RATE_LIMIT_WINDOW_SECS,
            )?,
            rate_limit_requests: parse_or(
                "RATE_LIMIT_REQUESTS",
                value("RATE_LIMIT_REQUESTS"),
                100,
            )?,
        })
    }

    pub fn session_expiration(&self) -> Duration {
        Duration::from_secs(self.session_expiration_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn jira_timeout(&self) -> Duration {
        Duration::from_secs(self.jira_timeout_secs)
    }

    pub fn jira_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.jira_max_attempts,
            base_delay: Duration::from_millis(self.jira_backoff_base_ms),
            max_delay: Duration::from_millis(self.jira_backoff_max_ms),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "***"))
            .field("jwt_secret", &"***")
            .field("encryption_key", &"***")
            .field("admin_email", &self.admin_email)
            .field("allowed_email_domain", &self.allowed_email_domain)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("api_base_uri", &self.api_base_uri)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("jira_max_attempts", &self.jira_max_attempts)
            .field("proxy_url", &self.proxy_url)
            .finish_non_exhaustive()
    }
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, value: v }),
        None => Ok(default),
    }
}

/// 解析后再检查范围，超出范围同样视为无效值
fn parse_in(
    key: &'static str,
    raw: Option<String>,
    default: u64,
    range: RangeInclusive<u64>,
) -> Result<u64, ConfigError> {
    let value = parse_or(key, raw, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        })
    }
}

fn split_list(raw: Option<String>, default: &[&str]) -> Vec<String> {
    match raw {
        Some(v) => v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}
