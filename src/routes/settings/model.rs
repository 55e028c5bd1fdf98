use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct IgnoreTicketRequest {
    pub ticket_key: String,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IgnoredTypes {
    pub issue_types: Vec<String>,
}

impl IgnoredTypes {
    /// 排序去重，去掉空白项
    pub fn normalized(self) -> Vec<String> {
        let mut types: Vec<String> = self
            .issue_types
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        types.sort();
        types.dedup();
        types
    }
}
