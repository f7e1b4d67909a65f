//! GitHub REST access: the issue list and per-issue comments
//!
//! Both sources sit behind traits so the run driver can be exercised with
//! in-memory fakes.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::constants::{GITHUB_ACCEPT, HTTP_TIMEOUT_SECS, MAX_PAGE_SIZE, USER_AGENT};
use crate::datetime::Timestamp;
use crate::record::{CommentRecord, IssueRecord};
use crate::{Context, IssueMdError, Result};

/// Owner and name of a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub owner: String,
    pub name: String,
}

impl RepoInfo {
    /// Accepts `https://github.com/<owner>/<repo>` with an optional trailing
    /// slash, `.git` suffix or deeper path.
    pub fn from_url(source: &str) -> Result<Self> {
        let url = Url::parse(source.trim())?;
        let mut segments = url
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty());

        match (segments.next(), segments.next()) {
            (Some(owner), Some(name)) => Ok(RepoInfo {
                owner: owner.to_string(),
                name: name.trim_end_matches(".git").to_string(),
            }),
            _ => Err(IssueMdError::Config(format!(
                "source_repository must look like https://github.com/<owner>/<repo>, found '{}'",
                source
            ))),
        }
    }
}

impl std::fmt::Display for RepoInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// What to ask the issue source for
#[derive(Debug, Clone)]
pub struct IssueQuery {
    pub repo: RepoInfo,
    pub max_issues: usize,
    /// Only issues updated at or after this time; invalid values are ignored
    pub since: Option<Timestamp>,
}

impl IssueQuery {
    pub fn page_size(&self) -> usize {
        self.max_issues.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Ascending-by-update issue listing, pull requests excluded
#[async_trait]
pub trait IssueSource: Send + Sync {
    async fn fetch_issues(&self, query: &IssueQuery) -> Result<Vec<IssueRecord>>;
}

/// Comments of one issue in chronological order
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn fetch_comments(&self, issue: &IssueRecord) -> Result<Vec<CommentRecord>>;
}

/// reqwest-backed client for api.github.com (or `ISSUEMD_API_URL`)
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
}

impl GitHubClient {
    pub fn new(ctx: &Context) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(GITHUB_ACCEPT),
        );
        if let Some(token) = &ctx.github_token {
            let mut value = reqwest::header::HeaderValue::from_str(&format!("token {}", token))?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(GitHubClient {
            client,
            api_url: ctx.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn issues_url(&self, query: &IssueQuery, page: usize) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/repos/{}/{}/issues",
            self.api_url, query.repo.owner, query.repo.name
        ))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("state", "all")
                .append_pair("sort", "updated")
                .append_pair("direction", "asc");
            if let Some(since) = query.since.and_then(|ts| ts.to_iso_string()) {
                pairs.append_pair("since", &since);
            }
            pairs
                .append_pair("per_page", &query.page_size().to_string())
                .append_pair("page", &page.to_string());
        }

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or(body);
            return Err(IssueMdError::GitHub(format!("{} ({} {})", message, status, url)));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl IssueSource for GitHubClient {
    async fn fetch_issues(&self, query: &IssueQuery) -> Result<Vec<IssueRecord>> {
        // The page size stays fixed across pages so page offsets line up;
        // the overshoot of the last page is cut off below.
        let per_page = query.page_size();
        let mut fetched: Vec<IssueRecord> = Vec::new();
        let mut page = 0;

        while fetched.len() < query.max_issues {
            page += 1;
            let url = self.issues_url(query, page)?;
            info!("About to fetch issues list from: {}", url);

            let batch: Vec<IssueRecord> = self.get_json(url).await?;
            let batch_len = batch.len();
            fetched.extend(batch);

            if batch_len < per_page {
                break;
            }
        }

        fetched.truncate(query.max_issues);

        let issues: Vec<IssueRecord> = fetched
            .into_iter()
            .filter(|issue| {
                if issue.is_pull_request() {
                    debug!("Skipping pull request #{}", issue.number);
                }
                !issue.is_pull_request()
            })
            .collect();

        info!("Fetched {} issues from {}", issues.len(), query.repo);
        Ok(issues)
    }
}

#[async_trait]
impl CommentSource for GitHubClient {
    async fn fetch_comments(&self, issue: &IssueRecord) -> Result<Vec<CommentRecord>> {
        if issue.comments_count == 0 {
            return Ok(Vec::new());
        }

        let mut comments = Vec::new();
        let mut page = 0;

        loop {
            page += 1;
            let mut url = Url::parse(&issue.comments_url)?;
            url.query_pairs_mut()
                .append_pair("per_page", &MAX_PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());

            let batch: Vec<CommentRecord> = self.get_json(url).await?;
            let batch_len = batch.len();
            comments.extend(batch);

            if batch_len < MAX_PAGE_SIZE {
                break;
            }
        }

        debug!("Fetched {} comments for issue #{}", comments.len(), issue.number);
        Ok(comments)
    }
}
