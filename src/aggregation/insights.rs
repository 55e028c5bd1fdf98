use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::jira::types::{ChangelogEntry, parse_jira_datetime};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from_status: Option<String>,
    pub to_status: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueInsights {
    pub issue_key: String,
    pub transitions: Vec<StatusTransition>,
    pub cycle_time_hours: Option<f64>,
    pub time_in_status_hours: BTreeMap<String, f64>,
}

/// 从变更记录中提取状态流转，按时间排序；时间戳无法解析的条目被跳过
pub fn status_transitions(entries: &[ChangelogEntry]) -> Vec<StatusTransition> {
    let mut out: Vec<StatusTransition> = entries
        .iter()
        .filter_map(|entry| parse_jira_datetime(&entry.created).map(|at| (at, entry)))
        .flat_map(|(at, entry)| {
            entry
                .items
                .iter()
                .filter(|item| item.field.eq_ignore_ascii_case("status"))
                .filter_map(move |item| {
                    Some(StatusTransition {
                        from_status: item.from_string.clone(),
                        to_status: item.to_string.clone()?,
                        at,
                    })
                })
        })
        .collect();
    out.sort_by_key(|t| t.at);
    out
}

/// 第一次进入 `start` 到之后最后一次进入 `end` 的小时数
pub fn cycle_time_hours(transitions: &[StatusTransition], start: &str, end: &str) -> Option<f64> {
    let started = transitions
        .iter()
        .find(|t| t.to_status.eq_ignore_ascii_case(start))?
        .at;
    let ended = transitions
        .iter()
        .filter(|t| t.at >= started && t.to_status.eq_ignore_ascii_case(end))
        .map(|t| t.at)
        .max()?;
    Some(hours_between(started, ended))
}

/// 相邻两次流转之间的停留时长，按状态累计；最后一个状态没有终点，不计入
pub fn time_in_status_hours(transitions: &[StatusTransition]) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    for pair in transitions.windows(2) {
        let (entered, left) = (&pair[0], &pair[1]);
        if left.at > entered.at {
            *out.entry(entered.to_status.clone()).or_insert(0.0) +=
                hours_between(entered.at, left.at);
        }
    }
    out
}

pub fn build_insights(
    issue_key: &str,
    entries: &[ChangelogEntry],
    start: &str,
    end: &str,
) -> IssueInsights {
    let transitions = status_transitions(entries);
    IssueInsights {
        issue_key: issue_key.to_string(),
        cycle_time_hours: cycle_time_hours(&transitions, start, end),
        time_in_status_hours: time_in_status_hours(&transitions),
        transitions,
    }
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}
