//! 工单筛选、工作量汇总、流转分析与工时汇总，全部是纯函数

pub mod filter;
pub mod insights;
pub mod summary;
pub mod worklog;

pub use filter::{DateRange, IssueFilter, PointRange, StatusRules, ValidationError};
pub use insights::{IssueInsights, StatusTransition, build_insights};
pub use summary::{Aggregation, AggregationContext, Totals, WorkloadEntry, aggregate};
pub use worklog::{ContributorTime, WorklogLine, WorklogSummary, summarize_worklogs};
