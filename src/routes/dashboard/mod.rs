mod handler;
mod model;

pub use handler::{issue_detail, issue_insights, issue_worklogs, project_dashboard, refresh};
