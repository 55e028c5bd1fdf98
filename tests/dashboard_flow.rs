//! 从模拟 Jira 拉取看板快照，再交给聚合层

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

use axum::{Json, Router, extract::Path, routing::get};
use chrono::{NaiveDate, Utc};
use jira_dashboard::aggregation::{AggregationContext, IssueFilter, StatusRules, aggregate};
use jira_dashboard::dashboard::{fetch_snapshot, observed_members};
use jira_dashboard::infrastructure::ApiToken;
use jira_dashboard::jira::{FieldCandidates, JiraClient, RetryPolicy, UNASSIGNED};
use serde_json::{Value, json};

fn raw_issue(key: &str, assignee: Option<&str>, status: &str, due: &str, points: Value) -> Value {
    json!({
        "key": key,
        "fields": {
            "summary": format!("Work on {}", key),
            "status": {"name": status},
            "assignee": assignee.map(|a| json!({"accountId": format!("acc-{}", a), "displayName": a})),
            "issuetype": {"name": "Task"},
            "duedate": due,
            "customfield_10016": points,
            "customfield_10020": [{"name": "Sprint 4"}]
        }
    })
}

async fn board_configuration(Path(id): Path<u64>) -> Json<Value> {
    Json(json!({
        "id": id,
        "name": format!("Board {}", id),
        "estimation": {"type": "field", "field": {"fieldId": "customfield_10016", "displayName": "Story point estimate"}}
    }))
}

async fn board_issues(Path(id): Path<u64>) -> Json<Value> {
    let issues = match id {
        1 => vec![
            raw_issue("OPS-1", Some("A"), "Done", "2020-01-01", json!(3)),
            raw_issue("OPS-2", Some("B"), "Open", "2020-01-01", json!(5)),
        ],
        _ => vec![
            // OPS-2 同时出现在两个看板上
            raw_issue("OPS-2", Some("B"), "Open", "2020-01-01", json!(5)),
            raw_issue("OPS-3", None, "Open", "2999-01-01", Value::Null),
        ],
    };
    let total = issues.len();
    Json(json!({"issues": issues, "startAt": 0, "maxResults": 100, "total": total}))
}

async fn fields() -> Json<Value> {
    Json(json!([
        {"id": "customfield_10016", "name": "Story point estimate", "custom": true},
        {"id": "customfield_10020", "name": "Sprint", "custom": true}
    ]))
}

#[tokio::test]
async fn snapshot_feeds_aggregation() {
    let router = Router::new()
        .route("/rest/agile/1.0/board/{id}/configuration", get(board_configuration))
        .route("/rest/agile/1.0/board/{id}/issue", get(board_issues))
        .route("/rest/api/3/field", get(fields));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = JiraClient::new(
        reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap(),
        &base,
        "dev@example.com",
        ApiToken::new("token"),
        RetryPolicy::default(),
    );
    let candidates = FieldCandidates {
        story_points: vec!["Story Points".into()],
        sprint: vec!["Sprint".into()],
        team: vec!["Team".into()],
    };

    let snapshot = fetch_snapshot(&client, "OPS", &[1, 2], &candidates, Utc::now())
        .await
        .unwrap();
    assert_eq!(snapshot.fields.story_points.as_deref(), Some("customfield_10016"));
    assert!(snapshot.fields.team.is_none());
    let keys: Vec<_> = snapshot.issues.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["OPS-1", "OPS-2", "OPS-3"]);
    assert_eq!(snapshot.issues[0].sprint.as_deref(), Some("Sprint 4"));

    let members = observed_members(&snapshot.issues);
    assert_eq!(members.len(), 2);

    let rules = StatusRules::new(vec!["Done".to_string()], vec!["In Progress".to_string()]);
    let labels = HashMap::new();
    let none = HashSet::new();
    let ctx = AggregationContext {
        today: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        rules: &rules,
        member_labels: &labels,
        ignored_keys: &none,
        ignored_types: &none,
    };

    let filter = IssueFilter {
        excluded_statuses: BTreeSet::from(["Done".to_string()]),
        ..IssueFilter::default()
    };
    let result = aggregate(&snapshot.issues, &filter, &ctx);

    let keys: Vec<_> = result.issues.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["OPS-2", "OPS-3"]);
    let overdue: Vec<_> = result.overdue.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(overdue, vec!["OPS-2"]);
    assert_eq!(result.workload["B"].total_story_points, 5.0);
    assert_eq!(result.workload[UNASSIGNED].total_tickets, 1);
    assert_eq!(result.totals.missing_story_points, 1);

    let counted: usize = result.workload.values().map(|w| w.total_tickets).sum();
    assert_eq!(counted, result.totals.tickets);
}
