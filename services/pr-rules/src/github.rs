//! GitHub REST Client
//!
//! Fetches the PR metadata the rules need and posts the review comment.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::draft::DraftStatusSource;
use crate::error::{Error, Result};
use crate::snapshot::{FileChangeSet, PullRequestSnapshot};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "lornu-ai-pr-rules";
const API_VERSION: &str = "2022-11-28";
const PER_PAGE: usize = 100;
// GitHub stops listing PR files after 3000 entries
const MAX_PAGES: u32 = 30;

/// Hidden marker identifying the comment this tool owns
pub const COMMENT_MARKER: &str = "<!-- pr-rules -->";

/// A pull request in a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequestRef {
    /// Build a reference from `owner/repo` and a PR number
    pub fn parse(repository: &str, number: u64) -> Result<Self> {
        match repository.split('/').collect::<Vec<_>>().as_slice() {
            [owner, repo] if !owner.is_empty() && !repo.is_empty() => Ok(Self {
                owner: owner.to_string(),
                repo: repo.to_string(),
                number,
            }),
            _ => Err(Error::Config(format!(
                "Invalid repository format: {}. Expected: owner/repo",
                repository
            ))),
        }
    }
}

impl std::fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

// ============================================================
// API Response Types
// ============================================================

#[derive(Debug, Deserialize)]
struct PullRequest {
    title: Option<String>,
    body: Option<String>,
    user: Option<User>,
    additions: Option<u64>,
    deletions: Option<u64>,
    #[serde(default)]
    labels: Vec<Label>,
    #[serde(default)]
    requested_reviewers: Vec<User>,
    #[serde(default)]
    requested_teams: Vec<Team>,
    draft: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Team {
    slug: String,
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    filename: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct IssueComment {
    id: u64,
    body: Option<String>,
}

#[derive(Debug, Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct DraftOnly {
    draft: Option<bool>,
}

// ============================================================
// Client Implementation
// ============================================================

/// GitHub REST API client authenticated with a bearer token
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    /// Create a client for the given API base URL
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.api_url, path))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::GitHub(format!("Request for {} failed: {}", what, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GitHub(format!("{} ({}): {}", what, status, body)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::GitHub(format!("Failed to parse {}: {}", what, e)))
    }

    async fn get_paged<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        for page in 1..=MAX_PAGES {
            let request = self
                .request(Method::GET, path)
                .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())]);
            let batch: Vec<T> = self.send(request, what).await?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
        }
        Ok(items)
    }

    fn pull_path(pr: &PullRequestRef) -> String {
        format!("/repos/{}/{}/pulls/{}", pr.owner, pr.repo, pr.number)
    }

    /// Fetch PR metadata, commits and changed files
    pub async fn fetch_snapshot(
        &self,
        pr: &PullRequestRef,
    ) -> Result<(PullRequestSnapshot, FileChangeSet)> {
        let path = Self::pull_path(pr);
        info!(pr = %pr, "Fetching pull request");

        let details: PullRequest = self
            .send(self.request(Method::GET, &path), "pull request")
            .await?;
        let commits: Vec<CommitEntry> = self
            .get_paged(&format!("{}/commits", path), "pull request commits")
            .await?;
        let files: Vec<FileEntry> = self
            .get_paged(&format!("{}/files", path), "pull request files")
            .await?;

        debug!(
            commits = commits.len(),
            files = files.len(),
            "Fetched pull request details"
        );

        let snapshot = PullRequestSnapshot {
            title: details.title.unwrap_or_default(),
            body: details.body.unwrap_or_default(),
            author: details.user.map(|user| user.login),
            additions: details.additions.unwrap_or_default(),
            deletions: details.deletions.unwrap_or_default(),
            labels: details.labels.into_iter().map(|l| l.name).collect(),
            requested_users: details
                .requested_reviewers
                .into_iter()
                .map(|u| u.login)
                .collect(),
            requested_teams: details
                .requested_teams
                .into_iter()
                .map(|t| t.slug)
                .collect(),
            draft: details.draft,
            commits: commits.into_iter().map(|c| c.commit.message).collect(),
        };

        Ok((snapshot, split_files(files)))
    }

    /// Fetch only the draft flag of a PR
    pub async fn fetch_draft(&self, pr: &PullRequestRef) -> Result<bool> {
        let details: DraftOnly = self
            .send(
                self.request(Method::GET, &Self::pull_path(pr)),
                "pull request draft status",
            )
            .await?;
        Ok(details.draft.unwrap_or(false))
    }

    /// Create the review comment, or update the one left by an earlier run
    ///
    /// Returns the comment ID.
    pub async fn upsert_comment(&self, pr: &PullRequestRef, body: &str) -> Result<u64> {
        let comments_path = format!(
            "/repos/{}/{}/issues/{}/comments",
            pr.owner, pr.repo, pr.number
        );
        let comments: Vec<IssueComment> = self
            .get_paged(&comments_path, "pull request comments")
            .await?;
        let existing = comments.into_iter().find(|comment| {
            comment
                .body
                .as_deref()
                .is_some_and(|body| body.contains(COMMENT_MARKER))
        });

        let comment: IssueComment = match existing {
            Some(previous) => {
                debug!(comment_id = previous.id, "Updating existing review comment");
                let path = format!(
                    "/repos/{}/{}/issues/comments/{}",
                    pr.owner, pr.repo, previous.id
                );
                self.send(
                    self.request(Method::PATCH, &path)
                        .json(&CommentRequest { body }),
                    "comment update",
                )
                .await?
            }
            None => {
                debug!("Creating review comment");
                self.send(
                    self.request(Method::POST, &comments_path)
                        .json(&CommentRequest { body }),
                    "comment creation",
                )
                .await?
            }
        };

        info!(pr = %pr, comment_id = comment.id, "Posted review comment");
        Ok(comment.id)
    }
}

fn split_files(files: Vec<FileEntry>) -> FileChangeSet {
    let mut changes = FileChangeSet::default();
    for file in files {
        match file.status.as_str() {
            "added" => changes.created.push(file.filename),
            "modified" | "renamed" | "changed" | "copied" => changes.modified.push(file.filename),
            _ => {}
        }
    }
    changes
}

/// Draft status lookup for one PR through the REST API
pub struct DraftLookup<'a> {
    client: &'a GitHubClient,
    pr: &'a PullRequestRef,
}

impl<'a> DraftLookup<'a> {
    pub fn new(client: &'a GitHubClient, pr: &'a PullRequestRef) -> Self {
        Self { client, pr }
    }
}

#[async_trait]
impl DraftStatusSource for DraftLookup<'_> {
    async fn is_draft(&self) -> Result<bool> {
        self.client.fetch_draft(self.pr).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repository() {
        let pr = PullRequestRef::parse("lornu-ai/lornu.ai", 42).unwrap();
        assert_eq!(pr.owner, "lornu-ai");
        assert_eq!(pr.repo, "lornu.ai");
        assert_eq!(pr.to_string(), "lornu-ai/lornu.ai#42");
    }

    #[test]
    fn test_parse_repository_rejects_bad_format() {
        assert!(PullRequestRef::parse("lornu-ai", 1).is_err());
        assert!(PullRequestRef::parse("a/b/c", 1).is_err());
        assert!(PullRequestRef::parse("/repo", 1).is_err());
    }

    #[test]
    fn test_split_files_by_status() {
        let files = vec![
            FileEntry {
                filename: "src/new.rs".to_string(),
                status: "added".to_string(),
            },
            FileEntry {
                filename: "src/lib.rs".to_string(),
                status: "modified".to_string(),
            },
            FileEntry {
                filename: "src/moved.rs".to_string(),
                status: "renamed".to_string(),
            },
            FileEntry {
                filename: "src/old.rs".to_string(),
                status: "removed".to_string(),
            },
        ];
        let changes = split_files(files);
        assert_eq!(changes.created, vec!["src/new.rs"]);
        assert_eq!(changes.modified, vec!["src/lib.rs", "src/moved.rs"]);
    }

    #[test]
    fn test_api_url_trailing_slash_trimmed() {
        let client = GitHubClient::new("https://ghe.example.com/api/v3/", "token").unwrap();
        assert_eq!(client.api_url, "https://ghe.example.com/api/v3");
    }
}
