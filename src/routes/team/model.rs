use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::TeamMemberEntity;

const MAX_LABEL_LEN: usize = 64;

#[derive(Debug, Serialize)]
pub struct TeamMember {
    pub account_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub labels: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<TeamMemberEntity> for TeamMember {
    fn from(m: TeamMemberEntity) -> Self {
        TeamMember {
            account_id: m.jira_account_id,
            display_name: m.display_name,
            email: m.email,
            avatar_url: m.avatar_url,
            labels: m.labels.0,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetLabelsRequest {
    pub labels: Vec<String>,
}

/// 去空白、去空串、保序去重
pub fn normalize_labels(labels: Vec<String>) -> Result<Vec<String>, String> {
    let mut result: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.trim();
        if label.is_empty() || result.iter().any(|l| l == label) {
            continue;
        }
        if label.chars().count() > MAX_LABEL_LEN {
            return Err(format!("标签不能超过{}个字符", MAX_LABEL_LEN));
        }
        result.push(label.to_string());
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_trimmed_and_deduplicated() {
        let labels = vec![" backend ".into(), "".into(), "backend".into(), "oncall".into()];
        assert_eq!(normalize_labels(labels).unwrap(), vec!["backend", "oncall"]);
    }

    #[test]
    fn overlong_label_is_rejected() {
        assert!(normalize_labels(vec!["x".repeat(65)]).is_err());
    }
}
