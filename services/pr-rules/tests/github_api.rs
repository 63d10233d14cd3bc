//! GitHub adapter tests against a mocked REST API

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pr_rules::github::{DraftLookup, COMMENT_MARKER};
use pr_rules::report::CommentReporter;
use pr_rules::{
    deliver, evaluate_with_lookup, resolve_draft, DraftStatusSource, GitHubClient,
    PullRequestRef, PullRequestSnapshot, RuleId, Rulebook,
};

fn pr_ref() -> PullRequestRef {
    PullRequestRef::parse("lornu-ai/lornu.ai", 7).unwrap()
}

fn pull_request_json(draft: bool) -> serde_json::Value {
    json!({
        "number": 7,
        "title": "Add webhook retries",
        "body": null,
        "user": { "login": "octocat" },
        "additions": 420,
        "deletions": 200,
        "labels": [],
        "requested_reviewers": [{ "login": "hubot" }],
        "requested_teams": [{ "slug": "platform" }],
        "draft": draft
    })
}

async fn mount_pull_request(server: &MockServer, draft: bool) {
    Mock::given(method("GET"))
        .and(path("/repos/lornu-ai/lornu.ai/pulls/7"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pull_request_json(draft)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/lornu-ai/lornu.ai/pulls/7/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "commit": { "message": "Add retry loop" } },
            { "commit": { "message": "fx" } }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/lornu-ai/lornu.ai/pulls/7/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "filename": "src/webhook.rs", "status": "modified" },
            { "filename": "src/retry.rs", "status": "added" },
            { "filename": "src/legacy.rs", "status": "removed" }
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_snapshot_maps_fields() {
    let server = MockServer::start().await;
    mount_pull_request(&server, false).await;

    let client = GitHubClient::new(server.uri(), "test-token").unwrap();
    let (pr, changes) = client.fetch_snapshot(&pr_ref()).await.unwrap();

    assert_eq!(pr.title, "Add webhook retries");
    assert_eq!(pr.body, "");
    assert_eq!(pr.author.as_deref(), Some("octocat"));
    assert_eq!(pr.diff_size(), 620);
    assert!(pr.labels.is_empty());
    assert_eq!(pr.requested_users, vec!["hubot"]);
    assert_eq!(pr.requested_teams, vec!["platform"]);
    assert_eq!(pr.draft, Some(false));
    assert_eq!(pr.commits, vec!["Add retry loop", "fx"]);
    assert_eq!(changes.created, vec!["src/retry.rs"]);
    assert_eq!(changes.modified, vec!["src/webhook.rs"]);
}

#[tokio::test]
async fn test_files_are_paginated() {
    let server = MockServer::start().await;
    let first_page: Vec<_> = (0..100)
        .map(|i| json!({ "filename": format!("src/m{}.rs", i), "status": "modified" }))
        .collect();

    Mock::given(method("GET"))
        .and(path("/repos/lornu-ai/lornu.ai/pulls/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pull_request_json(false)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/lornu-ai/lornu.ai/pulls/7/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/lornu-ai/lornu.ai/pulls/7/files"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(first_page)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/lornu-ai/lornu.ai/pulls/7/files"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "filename": "tests/retry_test.rs", "status": "added" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::new(server.uri(), "test-token").unwrap();
    let (_, changes) = client.fetch_snapshot(&pr_ref()).await.unwrap();

    assert_eq!(changes.modified.len(), 100);
    assert_eq!(changes.created, vec!["tests/retry_test.rs"]);
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/lornu-ai/lornu.ai/pulls/7"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let client = GitHubClient::new(server.uri(), "test-token").unwrap();
    let err = client.fetch_snapshot(&pr_ref()).await.unwrap_err();
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_draft_lookup_reads_flag() {
    let server = MockServer::start().await;
    mount_pull_request(&server, true).await;

    let client = GitHubClient::new(server.uri(), "test-token").unwrap();
    let pr_ref = pr_ref();
    let lookup = DraftLookup::new(&client, &pr_ref);

    assert!(lookup.is_draft().await.unwrap());
    assert!(
        resolve_draft(
            &PullRequestSnapshot::default(),
            Some(&lookup),
            Duration::from_secs(5)
        )
        .await
    );
}

#[tokio::test]
async fn test_draft_lookup_failure_fails_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/lornu-ai/lornu.ai/pulls/7"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = GitHubClient::new(server.uri(), "test-token").unwrap();
    let pr_ref = pr_ref();
    let lookup = DraftLookup::new(&client, &pr_ref);

    assert!(
        !resolve_draft(
            &PullRequestSnapshot::default(),
            Some(&lookup),
            Duration::from_secs(5)
        )
        .await
    );
}

#[tokio::test]
async fn test_draft_lookup_timeout_fails_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/lornu-ai/lornu.ai/pulls/7"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "draft": true }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = GitHubClient::new(server.uri(), "test-token").unwrap();
    let pr_ref = pr_ref();
    let lookup = DraftLookup::new(&client, &pr_ref);

    assert!(
        !resolve_draft(
            &PullRequestSnapshot::default(),
            Some(&lookup),
            Duration::from_millis(100)
        )
        .await
    );
}

#[tokio::test]
async fn test_comment_updates_previous_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/lornu-ai/lornu.ai/issues/7/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "body": "LGTM" },
            { "id": 5, "body": format!("{}\nold results", COMMENT_MARKER) }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/repos/lornu-ai/lornu.ai/issues/comments/5"))
        .and(body_string_contains("pr-rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 5 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/lornu-ai/lornu.ai/issues/7/comments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 9 })))
        .expect(0)
        .mount(&server)
        .await;

    let client = GitHubClient::new(server.uri(), "test-token").unwrap();
    let body = format!("{}\nnew results", COMMENT_MARKER);
    let id = client.upsert_comment(&pr_ref(), &body).await.unwrap();
    assert_eq!(id, 5);
}

#[tokio::test]
async fn test_comment_created_on_first_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/lornu-ai/lornu.ai/issues/7/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/lornu-ai/lornu.ai/issues/7/comments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 9 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::new(server.uri(), "test-token").unwrap();
    let id = client.upsert_comment(&pr_ref(), "body").await.unwrap();
    assert_eq!(id, 9);
}

#[tokio::test]
async fn test_review_end_to_end() {
    let server = MockServer::start().await;
    mount_pull_request(&server, false).await;
    Mock::given(method("GET"))
        .and(path("/repos/lornu-ai/lornu.ai/issues/7/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/lornu-ai/lornu.ai/issues/7/comments"))
        .and(body_string_contains("This PR does not include a description."))
        .and(body_string_contains("Good work @octocat!"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 11 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::new(server.uri(), "test-token").unwrap();
    let pr_ref = pr_ref();
    let (pr, changes) = client.fetch_snapshot(&pr_ref).await.unwrap();
    let lookup = DraftLookup::new(&client, &pr_ref);

    let evaluation = evaluate_with_lookup(
        pr,
        &changes,
        &Rulebook::default(),
        Some(&lookup as &dyn DraftStatusSource),
    )
    .await;

    let rules: Vec<_> = evaluation.outcomes.iter().map(|o| o.rule).collect();
    assert_eq!(
        rules,
        vec![
            RuleId::Labels,
            RuleId::Description,
            RuleId::DiffSize,
            RuleId::Tests,
            RuleId::TestsBeforeReview,
            RuleId::CommitMessages,
        ]
    );
    assert!(evaluation.is_blocking());

    let mut reporter = CommentReporter::new(&client, &pr_ref);
    deliver(&evaluation, &mut reporter).await.unwrap();
}
