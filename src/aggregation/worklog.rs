use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::jira::Worklog;

/// 工时记录没有作者时的归属
pub const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorklogLine {
    /// 开始时间，缺失时用创建时间
    pub started: Option<String>,
    pub time_spent: Option<String>,
    pub seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorTime {
    pub author: String,
    pub account_id: Option<String>,
    pub total_seconds: u64,
    pub total_hours: f64,
    /// 形如 `2h 30m`，零时长为 `-`
    pub total_display: String,
    pub entries: Vec<WorklogLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorklogSummary {
    pub issue_key: String,
    pub total_seconds: u64,
    pub contributors: Vec<ContributorTime>,
}

/// 按作者显示名汇总工时，总时长降序，相同时按名称排序
pub fn summarize_worklogs(issue_key: &str, worklogs: &[Worklog]) -> WorklogSummary {
    let mut by_author: BTreeMap<String, ContributorTime> = BTreeMap::new();

    for log in worklogs {
        let author = log
            .author
            .as_ref()
            .and_then(|a| a.display_name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_AUTHOR);
        let seconds = log.time_spent_seconds.unwrap_or(0);

        let entry = by_author
            .entry(author.to_string())
            .or_insert_with(|| ContributorTime {
                author: author.to_string(),
                account_id: None,
                total_seconds: 0,
                total_hours: 0.0,
                total_display: String::new(),
                entries: Vec::new(),
            });
        if entry.account_id.is_none() {
            entry.account_id = log.author.as_ref().and_then(|a| a.account_id.clone());
        }
        entry.total_seconds += seconds;
        entry.entries.push(WorklogLine {
            started: log.started.clone().or_else(|| log.created.clone()),
            time_spent: log.time_spent.clone(),
            seconds,
        });
    }

    let mut contributors: Vec<ContributorTime> = by_author
        .into_values()
        .map(|mut c| {
            c.total_hours = c.total_seconds as f64 / 3600.0;
            c.total_display = format_seconds(c.total_seconds);
            c
        })
        .collect();
    contributors.sort_by(|a, b| {
        b.total_seconds
            .cmp(&a.total_seconds)
            .then_with(|| a.author.cmp(&b.author))
    });

    WorklogSummary {
        issue_key: issue_key.to_string(),
        total_seconds: contributors.iter().map(|c| c.total_seconds).sum(),
        contributors,
    }
}

pub fn format_seconds(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    match (hours, minutes) {
        (0, 0) if seconds == 0 => "-".to_string(),
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}
