//! Tests for `GitHubPullRequestSource` against a mock GitHub API.

use github::GitHubPullRequestSource;
use pipeline::{FetchError, PullRequestNumber, PullRequestSource};
use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PULLS: &str = "/repos/owner/repo/pulls";

async fn source_for(server: &MockServer) -> GitHubPullRequestSource {
    GitHubPullRequestSource::new(format!("{}{PULLS}", server.uri())).expect("client should build")
}

#[tokio::test]
async fn fetches_head_sha_and_author() {
    let server = MockServer::start().await;
    let sha = "a".repeat(40);
    Mock::given(method("GET"))
        .and(path(format!("{PULLS}/42")))
        .and(header("accept", "application/vnd.github+json"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": 42,
            "state": "open",
            "head": { "sha": sha, "ref": "feature" },
            "user": { "login": "illicitonion", "id": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pr = source_for(&server)
        .await
        .fetch(PullRequestNumber::new(42))
        .await
        .expect("fetch should succeed");

    assert_eq!(pr.number, PullRequestNumber::new(42));
    assert_eq!(pr.head_sha, sha);
    assert_eq!(pr.author_login, "illicitonion");
}

#[tokio::test]
async fn sends_bearer_token_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PULLS}/1")))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "head": { "sha": "b".repeat(40) },
            "user": { "login": "someone" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server).await.with_token("s3cret");
    source
        .fetch(PullRequestNumber::new(1))
        .await
        .expect("authenticated fetch should succeed");
}

#[tokio::test]
async fn not_found_is_distinct_from_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PULLS}/9")))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })),
        )
        .mount(&server)
        .await;

    let err = source_for(&server)
        .await
        .fetch(PullRequestNumber::new(9))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        FetchError::NotFound {
            url: format!("{}{PULLS}/9", server.uri())
        }
    );
}

#[tokio::test]
async fn forbidden_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = source_for(&server)
        .await
        .fetch(PullRequestNumber::new(2))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Forbidden { status: 403, .. }), "{err:?}");
}

#[tokio::test]
async fn server_errors_are_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let err = source_for(&server)
        .await
        .fetch(PullRequestNumber::new(2))
        .await
        .unwrap_err();

    assert!(
        matches!(err, FetchError::UnexpectedStatus { status: 500, .. }),
        "{err:?}"
    );
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = source_for(&server)
        .await
        .fetch(PullRequestNumber::new(3))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Decode { .. }), "{err:?}");
}

#[tokio::test]
async fn unreachable_api_is_a_transport_error() {
    let server = MockServer::start().await;
    let base = format!("{}{PULLS}", server.uri());
    drop(server);

    let err = GitHubPullRequestSource::new(base)
        .expect("client should build")
        .fetch(PullRequestNumber::new(4))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Transport { .. }), "{err:?}");
}
