//! End-to-end tests against a local mock HTTP server.
//!
//! Unlike the in-crate unit tests, these run the real reqwest transport:
//! URL construction, Basic auth, JSON bodies, and quota headers all cross
//! an actual socket.

use std::time::Duration;

use backlog::{
    ClientConfig, Connection, QueryFilters, RateLimitOptions, RetryPolicy, WorkItemProvider,
    WorkItemQuery, WorkItemsClient,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server: &MockServer) -> WorkItemProvider {
    let connection = Connection::new("acme", "web", "token")
        .expect("valid connection")
        .with_host(&server.uri());
    let config = ClientConfig {
        connection,
        rate_limit: RateLimitOptions {
            max_concurrent: 4,
            requests_per_second: 1000,
            respect_headers: true,
        },
        retry: RetryPolicy::disabled(),
        timeout: Duration::from_secs(5),
    };
    let client = WorkItemsClient::new(config).expect("client");
    WorkItemProvider::new(client)
}

/// A filtered query runs WIQL, batch-fetches the matches, and returns
/// normalized records with the Basic credential on every request.
#[tokio::test]
async fn queries_and_fetches_normalized_records() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/acme/web/_apis/wit/wiql"))
        .and(query_param("api-version", "7.1-preview.3"))
        .and(header("Authorization", "Basic OnRva2Vu"))
        .and(body_json(serde_json::json!({
            "query": "SELECT [System.Id] FROM WorkItems WHERE ([System.State] = 'Active')"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "queryType": "flat",
            "workItems": [{"id": 12}, {"id": 7}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/acme/web/_apis/wit/workitems"))
        .and(query_param("ids", "7,12"))
        .and(header("Authorization", "Basic OnRva2Vu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "count": 2,
            "value": [
                {"id": 7, "rev": 3, "fields": {
                    "System.Title": "Fix login redirect",
                    "System.State": "Active",
                    "System.WorkItemType": "Bug",
                    "System.AssignedTo": {"displayName": "Dana Developer"},
                    "System.Tags": "auth; regression"
                }},
                {"id": 12, "rev": 1, "fields": {
                    "System.Title": "Add audit log",
                    "System.State": "Active",
                    "System.WorkItemType": "Task"
                }}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let query = WorkItemQuery {
        filters: QueryFilters {
            states: vec!["Active".to_string()],
            ..QueryFilters::default()
        },
        ..WorkItemQuery::default()
    };
    let records = provider.fetch_work_items(&query).await.expect("records");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, 7);
    assert_eq!(records[0].title, "Fix login redirect");
    assert_eq!(records[0].assignee.as_deref(), Some("Dana Developer"));
    assert_eq!(records[0].tags, vec!["auth", "regression"]);
    assert_eq!(records[1].id, 12);
    assert_eq!(records[1].assignee, None);
}

/// A 404 from the single-item endpoint surfaces as `Ok(None)`.
#[tokio::test]
async fn missing_item_resolves_to_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/acme/web/_apis/wit/workitems/999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "TF401232: Work item 999 does not exist"
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let record = provider.fetch_work_item(999).await.expect("lookup");
    assert!(record.is_none());
}

/// Comments post with a `{"text": ...}` body and read back normalized.
#[tokio::test]
async fn posts_and_reads_comments() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/acme/web/_apis/wit/workItems/5/comments"))
        .and(body_json(serde_json::json!({"text": "Deployed to staging"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 41,
            "workItemId": 5,
            "text": "Deployed to staging",
            "createdBy": {"displayName": "Dana Developer"},
            "createdDate": "2026-03-01T12:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/acme/web/_apis/wit/workItems/5/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "totalCount": 1,
            "count": 1,
            "comments": [{
                "id": 41,
                "workItemId": 5,
                "text": "Deployed to staging",
                "createdBy": {"uniqueName": "dana@acme.example"},
                "createdDate": "2026-03-01T12:00:00Z"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);

    let posted = provider
        .add_comment(5, "Deployed to staging")
        .await
        .expect("post comment");
    assert_eq!(posted.id, 41);
    assert_eq!(posted.author, "Dana Developer");

    let comments = provider.fetch_comments(5).await.expect("comments");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Deployed to staging");
    assert_eq!(comments[0].author, "dana@acme.example");
}

/// Quota headers on any response are recorded and visible in the
/// limiter's status snapshot.
#[tokio::test]
async fn quota_headers_surface_in_rate_limit_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/acme/web/_apis/wit/workitems/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ratelimit-limit", "200")
                .insert_header("x-ratelimit-remaining", "150")
                .insert_header("x-ratelimit-reset", "1767225600")
                .insert_header("x-ratelimit-resource", "WorkItemTracking")
                .set_body_json(serde_json::json!({"id": 1, "fields": {}})),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    provider.fetch_work_item(1).await.expect("fetch");

    let status = provider.rate_limit_status();
    let quota = status.server.expect("quota recorded");
    assert_eq!(quota.limit, 200.0);
    assert_eq!(quota.remaining, 150.0);
    assert_eq!(quota.resource, "WorkItemTracking");
    assert!(!status.is_throttling);
}
