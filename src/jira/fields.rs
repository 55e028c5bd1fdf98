use serde::{Deserialize, Serialize};

use super::types::{BoardConfiguration, JiraField};

/// 每次查询都请求的标准字段
pub const STANDARD_FIELDS: &[&str] = &[
    "summary",
    "status",
    "assignee",
    "issuetype",
    "priority",
    "duedate",
    "labels",
    "created",
    "updated",
    "resolutiondate",
];

/// 自定义字段名称候选列表
#[derive(Debug, Clone, Default)]
pub struct FieldCandidates {
    pub story_points: Vec<String>,
    pub sprint: Vec<String>,
    pub team: Vec<String>,
}

/// 已解析的自定义字段ID
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldMap {
    pub story_points: Option<String>,
    pub sprint: Option<String>,
    pub team: Option<String>,
}

impl FieldMap {
    /// 故事点优先使用看板的估算字段，其次按候选名称匹配
    pub fn resolve(
        boards: &[BoardConfiguration],
        fields: &[JiraField],
        candidates: &FieldCandidates,
    ) -> Self {
        let story_points = boards
            .iter()
            .find_map(|b| b.story_points_field().map(str::to_string))
            .or_else(|| resolve_field(fields, &candidates.story_points).map(|f| f.id.clone()));

        FieldMap {
            story_points,
            sprint: resolve_field(fields, &candidates.sprint).map(|f| f.id.clone()),
            team: resolve_field(fields, &candidates.team).map(|f| f.id.clone()),
        }
    }

    pub fn request_fields(&self) -> Vec<String> {
        let mut out: Vec<String> = STANDARD_FIELDS.iter().map(|f| f.to_string()).collect();
        for id in [&self.story_points, &self.sprint, &self.team].into_iter().flatten() {
            if !out.contains(id) {
                out.push(id.clone());
            }
        }
        out
    }
}

/// 按候选顺序返回第一个名称（不区分大小写）或ID匹配的字段
pub fn resolve_field<'a>(fields: &'a [JiraField], candidates: &[String]) -> Option<&'a JiraField> {
    candidates.iter().map(|c| c.trim()).find_map(|candidate| {
        fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(candidate) || f.id == candidate)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(id: &str, name: &str) -> JiraField {
        JiraField {
            id: id.into(),
            name: name.into(),
            custom: id.starts_with("customfield_"),
            clause_names: vec![],
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn candidate_order_wins_over_field_order() {
        let fields = vec![
            field("customfield_1", "Story point estimate"),
            field("customfield_2", "Story Points"),
        ];
        let found = resolve_field(&fields, &names(&["story points", "Story point estimate"]));
        assert_eq!(found.map(|f| f.id.as_str()), Some("customfield_2"));
    }

    #[test]
    fn missing_candidate_returns_none() {
        let fields = vec![field("summary", "Summary")];
        assert!(resolve_field(&fields, &names(&["Team"])).is_none());
        assert!(resolve_field(&fields, &[]).is_none());
    }

    #[test]
    fn field_id_is_accepted_as_candidate() {
        let fields = vec![field("customfield_10020", "Sprint")];
        let found = resolve_field(&fields, &names(&["customfield_10020"]));
        assert_eq!(found.map(|f| f.name.as_str()), Some("Sprint"));
    }

    #[test]
    fn request_fields_include_custom_ids_once() {
        let map = FieldMap {
            story_points: Some("customfield_1".into()),
            sprint: Some("customfield_1".into()),
            team: None,
        };
        let requested = map.request_fields();
        assert_eq!(requested.len(), STANDARD_FIELDS.len() + 1);
        assert_eq!(requested.last().map(String::as_str), Some("customfield_1"));
    }
}
