pub mod admin;
pub mod dashboard;
pub mod health;
pub mod jira;
pub mod project;
pub mod settings;
pub mod team;
pub mod user;
