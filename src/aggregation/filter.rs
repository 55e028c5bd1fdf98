use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::jira::Issue;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} range starts after it ends")]
    InvertedDateRange { field: &'static str },
    #[error("story point range minimum is greater than maximum")]
    InvertedPointRange,
    #[error("story point bound must be a non-negative number")]
    InvalidPointBound,
    #[error("{field} contains an empty value")]
    BlankValue { field: &'static str },
}

/// 闭区间日期范围，任一端可省略
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }

    fn validate(&self, field: &'static str) -> Result<(), ValidationError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(ValidationError::InvertedDateRange { field }),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PointRange {
    pub fn contains(&self, points: f64) -> bool {
        self.min.is_none_or(|min| points >= min) && self.max.is_none_or(|max| points <= max)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        for bound in [self.min, self.max].into_iter().flatten() {
            if !bound.is_finite() || bound < 0.0 {
                return Err(ValidationError::InvalidPointBound);
            }
        }
        match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => Err(ValidationError::InvertedPointRange),
            _ => Ok(()),
        }
    }
}

/// 用户选择的筛选条件，空集合表示不限
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueFilter {
    /// 经办人显示名或 accountId，`Unassigned` 匹配无经办人的工单
    pub assignees: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
    pub excluded_statuses: BTreeSet<String>,
    /// Jira 工单标签，命中任意一个即可
    pub labels: BTreeSet<String>,
    /// 团队成员标签
    pub team_labels: BTreeSet<String>,
    pub created: Option<DateRange>,
    pub due: Option<DateRange>,
    pub story_points: Option<PointRange>,
}

impl IssueFilter {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let sets: [(&'static str, &BTreeSet<String>); 5] = [
            ("assignees", &self.assignees),
            ("statuses", &self.statuses),
            ("excluded_statuses", &self.excluded_statuses),
            ("labels", &self.labels),
            ("team_labels", &self.team_labels),
        ];
        for (field, set) in sets {
            if set.iter().any(|v| v.trim().is_empty()) {
                return Err(ValidationError::BlankValue { field });
            }
        }
        if let Some(range) = &self.created {
            range.validate("created")?;
        }
        if let Some(range) = &self.due {
            range.validate("due")?;
        }
        if let Some(range) = &self.story_points {
            range.validate()?;
        }
        Ok(())
    }

    /// 创建日期缺失的工单不受创建日期范围限制；
    /// 到期日和故事点范围则要求字段存在
    pub fn matches(&self, issue: &Issue, member_labels: &HashMap<String, Vec<String>>) -> bool {
        if !self.assignees.is_empty() && !self.matches_assignee(issue) {
            return false;
        }
        if !self.team_labels.is_empty() {
            let labels = issue
                .assignee
                .as_ref()
                .and_then(|a| member_labels.get(&a.display_name));
            let hit = labels.is_some_and(|ls| ls.iter().any(|l| self.team_labels.contains(l)));
            if !hit {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&issue.status) {
            return false;
        }
        if self.excluded_statuses.contains(&issue.status) {
            return false;
        }
        if !self.labels.is_empty() && !issue.labels.iter().any(|l| self.labels.contains(l)) {
            return false;
        }
        if let (Some(range), Some(created)) = (&self.created, issue.created) {
            if !range.contains(created.date_naive()) {
                return false;
            }
        }
        if let Some(range) = &self.due {
            if !issue.due_date.is_some_and(|d| range.contains(d)) {
                return false;
            }
        }
        if let Some(range) = &self.story_points {
            if !issue.story_points.is_some_and(|p| range.contains(p)) {
                return false;
            }
        }
        true
    }

    // 按显示名匹配，与工作量分桶一致；也接受 accountId
    fn matches_assignee(&self, issue: &Issue) -> bool {
        self.assignees.contains(issue.assignee_name())
            || issue
                .assignee
                .as_ref()
                .is_some_and(|a| !a.account_id.is_empty() && self.assignees.contains(&a.account_id))
    }
}

/// 终态与进行中状态的判定规则
#[derive(Debug, Clone, Default)]
pub struct StatusRules {
    terminal: HashSet<String>,
    in_progress: HashSet<String>,
}

impl StatusRules {
    pub fn new<I, J>(terminal: I, in_progress: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        Self {
            terminal: terminal.into_iter().map(|s| s.to_lowercase()).collect(),
            in_progress: in_progress.into_iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    /// 状态名在终态列表中，或 Jira 状态分类为 done
    pub fn is_terminal(&self, issue: &Issue) -> bool {
        self.terminal.contains(&issue.status.to_lowercase())
            || issue.status_category.as_deref() == Some("done")
    }

    pub fn is_in_progress(&self, issue: &Issue) -> bool {
        !self.is_terminal(issue) && self.in_progress.contains(&issue.status.to_lowercase())
    }

    pub fn is_overdue(&self, issue: &Issue, today: NaiveDate) -> bool {
        issue.due_date.is_some_and(|due| due < today) && !self.is_terminal(issue)
    }
}
