use std::collections::HashSet;

use serde::Deserialize;

use crate::database::TrackedProject;
use crate::utils::is_valid_project_key;

#[derive(Debug, Deserialize)]
pub struct SaveProjectsRequest {
    pub projects: Vec<TrackedProject>,
}

impl SaveProjectsRequest {
    /// 校验项目键并去掉重复项目，看板按 id 去重
    pub fn into_validated(self) -> Result<Vec<TrackedProject>, String> {
        let mut seen = HashSet::new();
        let mut result = Vec::with_capacity(self.projects.len());
        for mut project in self.projects {
            project.project_key = project.project_key.trim().to_string();
            if !is_valid_project_key(&project.project_key) {
                return Err(format!("无效的项目键: {}", project.project_key));
            }
            if !seen.insert(project.project_key.clone()) {
                continue;
            }
            project.project_name = project.project_name.trim().to_string();
            if project.project_name.is_empty() {
                project.project_name = project.project_key.clone();
            }
            let mut board_ids = HashSet::new();
            project.boards.retain(|b| board_ids.insert(b.id));
            result.push(project);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::TrackedBoard;

    fn project(key: &str, boards: &[u64]) -> TrackedProject {
        TrackedProject {
            project_key: key.into(),
            project_name: String::new(),
            boards: boards
                .iter()
                .map(|id| TrackedBoard {
                    id: *id,
                    name: format!("Board {}", id),
                })
                .collect(),
        }
    }

    #[test]
    fn duplicates_are_collapsed() {
        let req = SaveProjectsRequest {
            projects: vec![project(" OPS ", &[1, 1, 2]), project("OPS", &[3])],
        };
        let projects = req.into_validated().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].project_key, "OPS");
        assert_eq!(projects[0].project_name, "OPS");
        assert_eq!(projects[0].boards.len(), 2);
    }

    #[test]
    fn malformed_key_is_rejected() {
        let req = SaveProjectsRequest {
            projects: vec![project("ops) OR (1=1", &[])],
        };
        assert!(req.into_validated().is_err());
    }
}
