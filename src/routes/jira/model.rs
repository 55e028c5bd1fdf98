use serde::{Deserialize, Serialize};

use crate::credentials::JiraConnection;
use crate::jira::types::{JiraBoard, JiraProject};

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
}

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub connection: Option<JiraConnection>,
}

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    pub project: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    pub id: String,
    pub key: String,
    pub name: String,
}

impl From<JiraProject> for ProjectSummary {
    fn from(p: JiraProject) -> Self {
        ProjectSummary {
            id: p.id,
            key: p.key,
            name: p.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BoardSummary {
    pub id: u64,
    pub name: String,
    pub board_type: Option<String>,
    pub project_key: Option<String>,
}

impl From<JiraBoard> for BoardSummary {
    fn from(b: JiraBoard) -> Self {
        BoardSummary {
            id: b.id,
            name: b.name,
            board_type: b.board_type,
            project_key: b.location.and_then(|l| l.project_key),
        }
    }
}
