use issuemd_core::github::{IssueQuery, RepoInfo};
use issuemd_core::{CommentSource, Context, GitHubClient, IssueMdError, IssueRecord, IssueSource};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

fn client_for(server: &ServerGuard) -> GitHubClient {
    let ctx = Context {
        api_url: server.url(),
        github_token: Some("secret".to_string()),
        ..Context::default()
    };
    GitHubClient::new(&ctx).unwrap()
}

fn query(max_issues: usize) -> IssueQuery {
    IssueQuery {
        repo: RepoInfo {
            owner: "o".to_string(),
            name: "r".to_string(),
        },
        max_issues,
        since: None,
    }
}

fn issue_json(server_url: &str, number: u64, comments: u64, pull_request: bool) -> serde_json::Value {
    let mut issue = json!({
        "number": number,
        "title": format!("Issue {}", number),
        "html_url": format!("https://github.com/o/r/issues/{}", number),
        "user": { "login": "ann", "html_url": "https://github.com/ann" },
        "state": "open",
        "body": "text",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": format!("2024-01-{:02}T00:00:00Z", number % 28 + 1),
        "comments": comments,
        "comments_url": format!("{}/repos/o/r/issues/{}/comments", server_url, number)
    });
    if pull_request {
        issue["pull_request"] = json!({ "url": "https://api.github.com/repos/o/r/pulls/1" });
    }
    issue
}

fn page_query(per_page: &str, page: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("state".into(), "all".into()),
        Matcher::UrlEncoded("sort".into(), "updated".into()),
        Matcher::UrlEncoded("direction".into(), "asc".into()),
        Matcher::UrlEncoded("per_page".into(), per_page.into()),
        Matcher::UrlEncoded("page".into(), page.into()),
    ])
}

#[tokio::test]
async fn single_short_page_ends_listing_and_drops_pull_requests() {
    let mut server = Server::new_async().await;
    let url = server.url();
    let body = json!([
        issue_json(&url, 1, 0, false),
        issue_json(&url, 2, 0, true),
        issue_json(&url, 3, 0, false),
    ]);

    let mock = server
        .mock("GET", "/repos/o/r/issues")
        .match_query(page_query("50", "1"))
        .match_header("authorization", "token secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(1)
        .create_async()
        .await;

    let issues = client_for(&server).fetch_issues(&query(50)).await.unwrap();

    mock.assert_async().await;
    let numbers: Vec<u64> = issues.iter().map(|i| i.number).collect();
    assert_eq!(numbers, [1, 3]);
}

#[tokio::test]
async fn listing_follows_pages_up_to_the_cap() {
    let mut server = Server::new_async().await;
    let url = server.url();

    let first: Vec<_> = (1..=100).map(|n| issue_json(&url, n, 0, false)).collect();
    let second: Vec<_> = (101..=200).map(|n| issue_json(&url, n, 0, false)).collect();

    let page1 = server
        .mock("GET", "/repos/o/r/issues")
        .match_query(page_query("100", "1"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serde_json::Value::Array(first).to_string())
        .expect(1)
        .create_async()
        .await;
    let page2 = server
        .mock("GET", "/repos/o/r/issues")
        .match_query(page_query("100", "2"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serde_json::Value::Array(second).to_string())
        .expect(1)
        .create_async()
        .await;

    let issues = client_for(&server).fetch_issues(&query(150)).await.unwrap();

    page1.assert_async().await;
    page2.assert_async().await;
    assert_eq!(issues.len(), 150);
    assert_eq!(issues.first().map(|i| i.number), Some(1));
    assert_eq!(issues.last().map(|i| i.number), Some(150));
}

#[tokio::test]
async fn since_is_sent_when_known() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/o/r/issues")
        .match_query(Matcher::UrlEncoded(
            "since".into(),
            "2024-01-02T00:00:00.000Z".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let mut q = query(10);
    q.since = issuemd_core::datetime::parse("2024-01-02T00:00:00Z");
    let issues = client_for(&server).fetch_issues(&q).await.unwrap();

    mock.assert_async().await;
    assert!(issues.is_empty());
}

#[tokio::test]
async fn api_error_message_is_surfaced() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/o/r/issues")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    let err = client_for(&server).fetch_issues(&query(10)).await.unwrap_err();

    assert!(err.is_transport());
    match err {
        IssueMdError::GitHub(msg) => assert!(msg.starts_with("Not Found (404"), "{}", msg),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn comments_are_fetched_in_order() {
    let mut server = Server::new_async().await;
    let url = server.url();
    let issue: IssueRecord = serde_json::from_value(issue_json(&url, 5, 2, false)).unwrap();

    let mock = server
        .mock("GET", "/repos/o/r/issues/5/comments")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("per_page".into(), "100".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                { "user": { "login": "bob", "html_url": "https://github.com/bob" },
                  "body": "first", "created_at": "2024-01-02T00:00:00Z", "updated_at": null },
                { "user": { "login": "cy", "html_url": "https://github.com/cy" },
                  "body": "second", "created_at": "2024-01-03T00:00:00Z" }
            ])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let comments = client_for(&server).fetch_comments(&issue).await.unwrap();

    mock.assert_async().await;
    let bodies: Vec<&str> = comments.iter().filter_map(|c| c.body.as_deref()).collect();
    assert_eq!(bodies, ["first", "second"]);
}

fn comment_json(n: u64) -> serde_json::Value {
    json!({
        "user": { "login": "bob", "html_url": "https://github.com/bob" },
        "body": format!("comment {}", n),
        "created_at": "2024-01-02T00:00:00Z"
    })
}

fn comment_page(page: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("per_page".into(), "100".into()),
        Matcher::UrlEncoded("page".into(), page.into()),
    ])
}

#[tokio::test]
async fn comments_follow_pages_until_a_short_one() {
    let mut server = Server::new_async().await;
    let url = server.url();
    let issue: IssueRecord = serde_json::from_value(issue_json(&url, 8, 130, false)).unwrap();

    let first: Vec<_> = (1..=100).map(comment_json).collect();
    let second: Vec<_> = (101..=130).map(comment_json).collect();

    let page1 = server
        .mock("GET", "/repos/o/r/issues/8/comments")
        .match_query(comment_page("1"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serde_json::Value::Array(first).to_string())
        .expect(1)
        .create_async()
        .await;
    let page2 = server
        .mock("GET", "/repos/o/r/issues/8/comments")
        .match_query(comment_page("2"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serde_json::Value::Array(second).to_string())
        .expect(1)
        .create_async()
        .await;

    let comments = client_for(&server).fetch_comments(&issue).await.unwrap();

    page1.assert_async().await;
    page2.assert_async().await;
    assert_eq!(comments.len(), 130);
    let bodies: Vec<&str> = comments.iter().filter_map(|c| c.body.as_deref()).collect();
    assert_eq!(bodies.first().copied(), Some("comment 1"));
    assert_eq!(bodies.get(99).copied(), Some("comment 100"));
    assert_eq!(bodies.get(100).copied(), Some("comment 101"));
    assert_eq!(bodies.last().copied(), Some("comment 130"));
}

#[tokio::test]
async fn issues_without_comments_skip_the_request() {
    let mut server = Server::new_async().await;
    let url = server.url();
    let issue: IssueRecord = serde_json::from_value(issue_json(&url, 6, 0, false)).unwrap();

    let mock = server
        .mock("GET", "/repos/o/r/issues/6/comments")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let comments = client_for(&server).fetch_comments(&issue).await.unwrap();

    mock.assert_async().await;
    assert!(comments.is_empty());
}

#[tokio::test]
async fn comment_failures_are_transport_errors() {
    let mut server = Server::new_async().await;
    let url = server.url();
    let issue: IssueRecord = serde_json::from_value(issue_json(&url, 7, 1, false)).unwrap();

    server
        .mock("GET", "/repos/o/r/issues/7/comments")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let err = client_for(&server).fetch_comments(&issue).await.unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("boom"));
}
