//! Jira Cloud REST/Agile 客户端

pub mod client;
pub mod error;
pub mod fields;
pub mod types;

pub use client::{JiraClient, RetryPolicy};
pub use error::JiraError;
pub use fields::{FieldCandidates, FieldMap, resolve_field};
pub use types::{Assignee, Issue, UNASSIGNED, Worklog, WorklogAuthor};
