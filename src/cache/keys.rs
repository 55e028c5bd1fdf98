/// Jira 数据缓存键前缀
const JIRA_PREFIX: &str = "jira:";

/// 限流计数键前缀
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// 用户的缓存所有者标识
pub fn owner_key(user_id: i64) -> String {
    format!("user:{}", user_id)
}

/// 生成 `jira:{owner}:{resource}` 缓存键
pub fn entry_key(owner: &str, resource: &str) -> String {
    format!("{}{}:{}", JIRA_PREFIX, owner, resource)
}

/// 某个所有者全部缓存键的公共前缀
pub fn owner_prefix(owner: &str) -> String {
    format!("{}{}:", JIRA_PREFIX, owner)
}

pub fn rate_limit_key(client: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, client)
}

pub fn projects_resource() -> String {
    "projects".to_string()
}

pub fn boards_resource(project_key: Option<&str>) -> String {
    match project_key {
        Some(key) => format!("boards:{}", key),
        None => "boards".to_string(),
    }
}

pub fn issues_resource(project_key: &str) -> String {
    format!("{}:issues", project_key)
}

pub fn last_refresh_resource(project_key: &str) -> String {
    format!("{}:last_refresh", project_key)
}

pub fn changelog_resource(issue_key: &str) -> String {
    format!("changelog:{}", issue_key)
}

pub fn issue_resource(issue_key: &str) -> String {
    format!("issue:{}", issue_key)
}

pub fn worklogs_resource(issue_key: &str) -> String {
    format!("worklogs:{}", issue_key)
}

/// 按工单缓存的资源里属于某个项目的前缀，工单键形如 `{项目键}-{序号}`
pub fn project_issue_prefixes(project_key: &str) -> [String; 3] {
    let issue_prefix = format!("{}-", project_key);
    [
        changelog_resource(&issue_prefix),
        issue_resource(&issue_prefix),
        worklogs_resource(&issue_prefix),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_scoped_by_owner() {
        let owner = owner_key(7);
        assert_eq!(entry_key(&owner, &issues_resource("ACME")), "jira:user:7:ACME:issues");
        assert!(entry_key(&owner, "projects").starts_with(&owner_prefix(&owner)));
        assert!(!entry_key(&owner_key(70), "projects").starts_with(&owner_prefix(&owner)));
    }

    #[test]
    fn project_prefixes_do_not_cover_similar_keys() {
        let prefixes = project_issue_prefixes("ACME");
        assert!(prefixes.iter().any(|p| changelog_resource("ACME-12").starts_with(p.as_str())));
        assert!(prefixes.iter().any(|p| worklogs_resource("ACME-3").starts_with(p.as_str())));
        assert!(!prefixes.iter().any(|p| issue_resource("ACME2-1").starts_with(p.as_str())));
        assert!(!prefixes.iter().any(|p| issues_resource("ACME").starts_with(p.as_str())));
    }
}
