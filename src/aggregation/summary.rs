use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::filter::{IssueFilter, StatusRules};
use crate::jira::Issue;

/// 聚合所需的外部输入，参考日期由调用方给出
pub struct AggregationContext<'a> {
    pub today: NaiveDate,
    pub rules: &'a StatusRules,
    /// 团队成员显示名 → 标签
    pub member_labels: &'a HashMap<String, Vec<String>>,
    pub ignored_keys: &'a HashSet<String>,
    pub ignored_types: &'a HashSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadEntry {
    pub total_tickets: usize,
    pub total_story_points: f64,
    pub in_progress: usize,
    pub done: usize,
    pub overdue: usize,
    pub missing_story_points: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub tickets: usize,
    pub story_points: f64,
    pub estimated_tickets: usize,
    pub overdue: usize,
    pub missing_story_points: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub issues: Vec<Issue>,
    pub totals: Totals,
    pub workload: BTreeMap<String, WorkloadEntry>,
    pub status_distribution: BTreeMap<String, usize>,
    pub status_by_assignee: BTreeMap<String, BTreeMap<String, usize>>,
    /// 已过期且未到终态，按到期日排序
    pub overdue: Vec<Issue>,
    pub missing_story_points: Vec<Issue>,
}

/// 先去掉忽略的工单和类型，再按筛选条件过滤并汇总
pub fn aggregate(issues: &[Issue], filter: &IssueFilter, ctx: &AggregationContext<'_>) -> Aggregation {
    let filtered: Vec<Issue> = issues
        .iter()
        .filter(|i| !ctx.ignored_keys.contains(&i.key))
        .filter(|i| !ctx.ignored_types.contains(&i.issue_type))
        .filter(|i| filter.matches(i, ctx.member_labels))
        .cloned()
        .collect();

    let mut out = Aggregation::default();

    for issue in &filtered {
        let assignee = issue.assignee_name().to_string();
        let overdue = ctx.rules.is_overdue(issue, ctx.today);

        let entry = out.workload.entry(assignee.clone()).or_default();
        entry.total_tickets += 1;
        match issue.story_points {
            Some(points) => {
                entry.total_story_points += points;
                out.totals.story_points += points;
                out.totals.estimated_tickets += 1;
            }
            None => {
                entry.missing_story_points += 1;
                out.missing_story_points.push(issue.clone());
            }
        }
        if ctx.rules.is_terminal(issue) {
            entry.done += 1;
        } else if ctx.rules.is_in_progress(issue) {
            entry.in_progress += 1;
        }
        if overdue {
            entry.overdue += 1;
            out.overdue.push(issue.clone());
        }

        *out.status_distribution.entry(issue.status.clone()).or_default() += 1;
        *out.status_by_assignee
            .entry(assignee)
            .or_default()
            .entry(issue.status.clone())
            .or_default() += 1;
    }

    out.overdue
        .sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.key.cmp(&b.key)));
    out.totals.tickets = filtered.len();
    out.totals.overdue = out.overdue.len();
    out.totals.missing_story_points = out.missing_story_points.len();
    out.issues = filtered;
    out
}
