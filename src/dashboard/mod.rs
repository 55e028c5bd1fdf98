//! 仪表盘数据编排：缓存读穿、Jira 并发拉取、团队成员同步

pub mod catalog;
pub mod snapshot;

pub use catalog::{
    disconnect_jira, issue_detail, issue_insights, issue_worklogs, list_boards, list_projects,
    refresh,
};
pub use snapshot::{LoadedSnapshot, ProjectSnapshot, fetch_snapshot, load_snapshot, observed_members};
