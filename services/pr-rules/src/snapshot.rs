//! Pull Request Snapshot
//!
//! Read-only view of the PR metadata the rules inspect. Built once per run,
//! either from the GitHub API or from an event file, and never mutated while
//! rules are evaluated.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::Result;

/// PR metadata as seen by the rules
///
/// Every field is optional in the input; absent or `null` values fall back to
/// their empty default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequestSnapshot {
    /// PR title
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    /// PR description, empty when the author wrote none
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
    /// Login of the PR author
    pub author: Option<String>,
    /// Lines added
    #[serde(deserialize_with = "null_as_default")]
    pub additions: u64,
    /// Lines deleted
    #[serde(deserialize_with = "null_as_default")]
    pub deletions: u64,
    /// Issue labels
    #[serde(deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
    /// Logins of requested individual reviewers
    #[serde(deserialize_with = "null_as_default")]
    pub requested_users: Vec<String>,
    /// Slugs of requested reviewer teams
    #[serde(deserialize_with = "null_as_default")]
    pub requested_teams: Vec<String>,
    /// Draft flag. `None` when the host did not provide it and it still has
    /// to be looked up.
    pub draft: Option<bool>,
    /// Commit messages in PR order
    #[serde(deserialize_with = "null_as_default")]
    pub commits: Vec<String>,
}

impl PullRequestSnapshot {
    /// Total changed lines
    pub fn diff_size(&self) -> u64 {
        self.additions.saturating_add(self.deletions)
    }

    /// Whether the PR is known to be a draft
    pub fn is_draft(&self) -> bool {
        self.draft.unwrap_or(false)
    }

    /// Whether any individual or team reviewer has been requested
    pub fn has_requested_reviewers(&self) -> bool {
        !self.requested_users.is_empty() || !self.requested_teams.is_empty()
    }

    /// Return a copy with the draft flag set
    pub fn with_draft(mut self, draft: bool) -> Self {
        self.draft = Some(draft);
        self
    }
}

/// Files touched by the PR
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChangeSet {
    /// Paths of files added by the PR
    #[serde(deserialize_with = "null_as_default")]
    pub created: Vec<String>,
    /// Paths of files modified by the PR
    #[serde(deserialize_with = "null_as_default")]
    pub modified: Vec<String>,
}

impl FileChangeSet {
    /// Created and modified paths, created first
    pub fn touched(&self) -> impl Iterator<Item = &str> {
        self.created
            .iter()
            .chain(self.modified.iter())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty()
    }
}

/// Offline input: a snapshot and its change set in one JSON document
///
/// ```json
/// { "pr": { "title": "Add retries", "labels": ["enhancement"] },
///   "changes": { "modified": ["src/client.rs"] } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequestEvent {
    pub pr: PullRequestSnapshot,
    pub changes: FileChangeSet,
}

impl PullRequestEvent {
    /// Parse an event from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read an event file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let event = PullRequestEvent::from_json(r#"{"pr": {"title": "Add cache"}}"#).unwrap();

        assert_eq!(event.pr.title, "Add cache");
        assert!(event.pr.body.is_empty());
        assert_eq!(event.pr.author, None);
        assert_eq!(event.pr.draft, None);
        assert!(!event.pr.is_draft());
        assert!(event.changes.is_empty());
    }

    #[test]
    fn test_null_body_is_empty() {
        let event =
            PullRequestEvent::from_json(r#"{"pr": {"body": null, "labels": null}}"#).unwrap();
        assert_eq!(event.pr.body, "");
        assert!(event.pr.labels.is_empty());
    }

    #[test]
    fn test_diff_size_saturates() {
        let pr = PullRequestSnapshot {
            additions: u64::MAX,
            deletions: 10,
            ..Default::default()
        };
        assert_eq!(pr.diff_size(), u64::MAX);
    }

    #[test]
    fn test_touched_lists_created_then_modified() {
        let changes = FileChangeSet {
            created: vec!["a.rs".to_string()],
            modified: vec!["b.rs".to_string()],
        };
        assert_eq!(changes.touched().collect::<Vec<_>>(), vec!["a.rs", "b.rs"]);
    }

    #[test]
    fn test_has_requested_reviewers() {
        let mut pr = PullRequestSnapshot::default();
        assert!(!pr.has_requested_reviewers());
        pr.requested_teams.push("platform".to_string());
        assert!(pr.has_requested_reviewers());
    }
}
