//! 用本地 axum 服务模拟 Jira，验证客户端的重试、错误映射和分页

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use jira_dashboard::aggregation::summarize_worklogs;
use jira_dashboard::infrastructure::ApiToken;
use jira_dashboard::jira::{FieldMap, JiraClient, JiraError, RetryPolicy};
use serde::Deserialize;
use serde_json::json;

type Hits = Arc<AtomicUsize>;

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: &str, max_attempts: u32) -> JiraClient {
    JiraClient::new(
        reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap(),
        base_url,
        "dev@example.com",
        ApiToken::new("secret-token"),
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
        },
    )
}

async fn always_limited(State(hits): State<Hits>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::TOO_MANY_REQUESTS,
        [("retry-after", "0")],
        "slow down",
    )
        .into_response()
}

#[tokio::test]
async fn rate_limit_is_retried_then_surfaced() {
    let hits = Hits::default();
    let base = spawn(
        Router::new()
            .route("/rest/api/3/myself", get(always_limited))
            .with_state(hits.clone()),
    )
    .await;

    let err = client(&base, 3).myself().await.unwrap_err();
    assert!(matches!(
        err,
        JiraError::RateLimited {
            retry_after_secs: Some(0),
            attempts: 3
        }
    ));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn rate_limit_is_retried_at_least_once() {
    let hits = Hits::default();
    let base = spawn(
        Router::new()
            .route("/rest/api/3/myself", get(always_limited))
            .with_state(hits.clone()),
    )
    .await;

    let err = client(&base, 1).myself().await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn recovers_after_transient_rate_limit() {
    async fn flaky(State(hits): State<Hits>) -> Response {
        if hits.fetch_add(1, Ordering::SeqCst) == 0 {
            return StatusCode::TOO_MANY_REQUESTS.into_response();
        }
        Json(json!({
            "accountId": "abc-123",
            "displayName": "Dana Dev",
            "emailAddress": "dana@example.com",
            "active": true
        }))
        .into_response()
    }

    let hits = Hits::default();
    let base = spawn(
        Router::new()
            .route("/rest/api/3/myself", get(flaky))
            .with_state(hits.clone()),
    )
    .await;

    let me = client(&base, 3).myself().await.unwrap();
    assert_eq!(me.account_id, "abc-123");
    assert_eq!(me.display_name, "Dana Dev");
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn auth_failures_are_not_retried() {
    async fn unauthorized(State(hits): State<Hits>) -> StatusCode {
        hits.fetch_add(1, Ordering::SeqCst);
        StatusCode::UNAUTHORIZED
    }
    async fn forbidden(State(hits): State<Hits>) -> StatusCode {
        hits.fetch_add(1, Ordering::SeqCst);
        StatusCode::FORBIDDEN
    }

    let hits = Hits::default();
    let base = spawn(
        Router::new()
            .route("/rest/api/3/myself", get(unauthorized))
            .route("/rest/api/3/field", get(forbidden))
            .with_state(hits.clone()),
    )
    .await;
    let client = client(&base, 5);

    let err = client.myself().await.unwrap_err();
    assert!(matches!(err, JiraError::AuthenticationFailed));
    assert!(err.needs_reconnect());
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let err = client.list_fields().await.unwrap_err();
    assert!(matches!(err, JiraError::AuthorizationFailed));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn basic_auth_header_is_sent() {
    async fn check(headers: HeaderMap) -> Response {
        // base64("dev@example.com:secret-token")
        let expected = "Basic ZGV2QGV4YW1wbGUuY29tOnNlY3JldC10b2tlbg==";
        match headers.get("authorization").and_then(|h| h.to_str().ok()) {
            Some(value) if value == expected => {
                Json(json!({"accountId": "ok", "displayName": "Ok"})).into_response()
            }
            _ => StatusCode::UNAUTHORIZED.into_response(),
        }
    }

    let base = spawn(Router::new().route("/rest/api/3/myself", get(check))).await;
    let me = client(&base, 2).myself().await.unwrap();
    assert_eq!(me.account_id, "ok");
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page {
    start_at: usize,
}

#[tokio::test]
async fn paged_values_are_drained() {
    async fn projects(Query(page): Query<Page>) -> Json<serde_json::Value> {
        let all: Vec<_> = (0..3)
            .map(|i| json!({"id": format!("{}", 10 + i), "key": format!("P{}", i), "name": format!("Project {}", i)}))
            .collect();
        // 每页两个
        let values: Vec<_> = all.iter().skip(page.start_at).take(2).cloned().collect();
        let is_last = page.start_at + values.len() >= all.len();
        Json(json!({
            "values": values,
            "startAt": page.start_at,
            "maxResults": 2,
            "total": all.len(),
            "isLast": is_last,
            "unknownField": {"ignored": true}
        }))
    }

    let base = spawn(Router::new().route("/rest/api/3/project/search", get(projects))).await;
    let projects = client(&base, 2).list_projects().await.unwrap();
    let keys: Vec<_> = projects.iter().map(|p| p.key.as_str()).collect();
    assert_eq!(keys, vec!["P0", "P1", "P2"]);
}

#[tokio::test]
async fn board_issues_follow_total() {
    async fn issues(Query(page): Query<Page>) -> Json<serde_json::Value> {
        let issues: Vec<_> = (page.start_at..(page.start_at + 2).min(3))
            .map(|i| {
                json!({
                    "key": format!("OPS-{}", i + 1),
                    "fields": {
                        "summary": format!("Task {}", i + 1),
                        "status": {"name": "Open", "statusCategory": {"key": "new"}},
                        "customfield_10016": 3.0
                    }
                })
            })
            .collect();
        Json(json!({"issues": issues, "startAt": page.start_at, "maxResults": 2, "total": 3}))
    }

    let base = spawn(Router::new().route("/rest/agile/1.0/board/7/issue", get(issues))).await;
    let issues = client(&base, 2)
        .board_issues(7, None, &["summary".to_string()])
        .await
        .unwrap();
    let keys: Vec<_> = issues.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["OPS-1", "OPS-2", "OPS-3"]);
}

#[tokio::test]
async fn search_follows_next_page_token() {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct SearchBody {
        next_page_token: Option<String>,
    }

    async fn search(Json(body): Json<SearchBody>) -> Json<serde_json::Value> {
        match body.next_page_token.as_deref() {
            None => Json(json!({
                "issues": [{"key": "OPS-1", "fields": {}}, {"key": "OPS-2", "fields": {}}],
                "nextPageToken": "page-2"
            })),
            Some("page-2") => Json(json!({"issues": [{"key": "OPS-3", "fields": {}}]})),
            Some(_) => Json(json!({"issues": []})),
        }
    }

    let base = spawn(Router::new().route("/rest/api/3/search/jql", post(search))).await;
    let client = client(&base, 2);

    let all = client.search_issues("project = OPS", &[], 10).await.unwrap();
    assert_eq!(all.len(), 3);

    let truncated = client.search_issues("project = OPS", &[], 1).await.unwrap();
    assert_eq!(truncated.len(), 1);
    assert_eq!(truncated[0].key, "OPS-1");
}

#[tokio::test]
async fn missing_field_is_reported() {
    async fn fields() -> Json<serde_json::Value> {
        Json(json!([
            {"id": "summary", "name": "Summary", "custom": false},
            {"id": "customfield_10020", "name": "Sprint", "custom": true}
        ]))
    }

    let base = spawn(Router::new().route("/rest/api/3/field", get(fields))).await;
    let client = client(&base, 2);

    let sprint = client.discover_field(&["Sprint".to_string()]).await.unwrap();
    assert_eq!(sprint.id, "customfield_10020");

    let err = client
        .discover_field(&["Story Points".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, JiraError::FieldNotFound(_)));
}

#[tokio::test]
async fn server_errors_carry_jira_message() {
    async fn broken() -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"errorMessages": ["The value 'NOPE' does not exist"]})),
        )
            .into_response()
    }

    let base = spawn(Router::new().route("/rest/agile/1.0/board", get(broken))).await;
    let err = client(&base, 2).list_boards(Some("NOPE")).await.unwrap_err();
    match err {
        JiraError::Api { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("does not exist"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_transient() {
    // 绑定后立即释放端口，保证无人监听
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}", addr), 3)
        .myself()
        .await
        .unwrap_err();
    assert!(matches!(err, JiraError::TransientNetwork(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn sprints_and_assignable_users() {
    #[derive(Deserialize)]
    struct SprintQuery {
        state: Option<String>,
    }

    async fn sprints(Query(q): Query<SprintQuery>) -> Json<serde_json::Value> {
        let all = [
            json!({"id": 1, "name": "Sprint 1", "state": "closed"}),
            json!({"id": 2, "name": "Sprint 2", "state": "active", "goal": "Ship"}),
        ];
        let values: Vec<_> = all
            .into_iter()
            .filter(|s| q.state.as_deref().is_none_or(|state| s["state"] == state))
            .collect();
        Json(json!({"values": values, "isLast": true}))
    }

    async fn assignable() -> Json<serde_json::Value> {
        Json(json!([
            {"accountId": "acc-1", "displayName": "Ana", "active": true},
            {"accountId": "acc-2", "displayName": "Ben", "active": false}
        ]))
    }

    let base = spawn(
        Router::new()
            .route("/rest/agile/1.0/board/7/sprint", get(sprints))
            .route("/rest/api/3/user/assignable/search", get(assignable)),
    )
    .await;
    let client = client(&base, 2);

    let active = client.list_sprints(7, Some("active")).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].goal.as_deref(), Some("Ship"));
    assert_eq!(client.list_sprints(7, None).await.unwrap().len(), 2);

    let members = client.project_members("OPS").await.unwrap();
    let names: Vec<_> = members.iter().map(|m| m.display_name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "Ben"]);
}

#[tokio::test]
async fn changelog_pages_until_last() {
    async fn changelog(Query(page): Query<Page>) -> Json<serde_json::Value> {
        let entry = |at: &str, to: &str| {
            json!({
                "id": "1",
                "created": at,
                "items": [{"field": "status", "fromString": "Open", "toString": to}]
            })
        };
        if page.start_at == 0 {
            Json(json!({
                "values": [entry("2024-01-01T09:00:00.000+0000", "In Progress")],
                "startAt": 0, "maxResults": 1, "total": 2, "isLast": false
            }))
        } else {
            Json(json!({
                "values": [entry("2024-01-02T09:00:00.000+0000", "Done")],
                "startAt": 1, "maxResults": 1, "total": 2, "isLast": true
            }))
        }
    }

    let base = spawn(Router::new().route("/rest/api/3/issue/OPS-1/changelog", get(changelog))).await;
    let entries = client(&base, 2).issue_changelog("OPS-1").await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].items[0].to_string.as_deref(), Some("Done"));
}

#[tokio::test]
async fn single_issue_requests_listed_fields() {
    async fn issue(
        Query(query): Query<std::collections::HashMap<String, String>>,
    ) -> Json<serde_json::Value> {
        Json(json!({
            "key": "OPS-7",
            "fields": {
                "summary": "Rotate keys",
                "status": {"name": "In Review", "statusCategory": {"key": "indeterminate"}},
                "assignee": {"accountId": "u-1", "displayName": "Ana"},
                "customfield_10016": 3,
                "requestedFields": query.get("fields").cloned().unwrap_or_default()
            }
        }))
    }

    let base = spawn(Router::new().route("/rest/api/3/issue/OPS-7", get(issue))).await;
    let field_map = FieldMap {
        story_points: Some("customfield_10016".into()),
        sprint: None,
        team: None,
    };
    let requested = field_map.request_fields();
    let raw = client(&base, 2).issue("OPS-7", &requested).await.unwrap();

    let echoed = raw.fields.extra.get("requestedFields").and_then(|v| v.as_str());
    assert_eq!(echoed, Some(requested.join(",").as_str()));

    let issue = raw.into_issue(&field_map);
    assert_eq!(issue.status, "In Review");
    assert_eq!(issue.assignee_name(), "Ana");
    assert_eq!(issue.story_points, Some(3.0));
}

#[tokio::test]
async fn missing_issue_is_not_found() {
    let base = spawn(Router::new()).await;
    let err = client(&base, 2).issue("OPS-404", &[]).await.unwrap_err();
    assert!(matches!(err, JiraError::NotFound(path) if path.ends_with("/issue/OPS-404")));
}

#[tokio::test]
async fn worklogs_follow_total_and_summarize_by_author() {
    async fn worklog(Query(page): Query<Page>) -> Json<serde_json::Value> {
        let entry = |name: &str, seconds: u64| {
            json!({
                "id": "1",
                "author": {"accountId": format!("id-{name}"), "displayName": name},
                "timeSpent": "x",
                "timeSpentSeconds": seconds,
                "started": "2024-01-01T09:00:00.000+0000",
                "comment": {"type": "doc", "version": 1, "content": []}
            })
        };
        match page.start_at {
            0 => Json(json!({
                "startAt": 0, "maxResults": 2, "total": 3,
                "worklogs": [entry("Ana", 1800), entry("Bo", 7200)]
            })),
            _ => Json(json!({
                "startAt": 2, "maxResults": 2, "total": 3,
                "worklogs": [entry("Ana", 3600)]
            })),
        }
    }

    let base = spawn(Router::new().route("/rest/api/3/issue/OPS-1/worklog", get(worklog))).await;
    let worklogs = client(&base, 2).issue_worklogs("OPS-1").await.unwrap();
    assert_eq!(worklogs.len(), 3);

    let summary = summarize_worklogs("OPS-1", &worklogs);
    let totals: Vec<_> = summary
        .contributors
        .iter()
        .map(|c| (c.author.as_str(), c.total_seconds, c.entries.len()))
        .collect();
    assert_eq!(totals, [("Bo", 7200, 1), ("Ana", 5400, 2)]);
    assert_eq!(summary.total_seconds, 12600);
}
