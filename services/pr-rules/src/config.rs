//! Rule Configuration
//!
//! `RulesConfig` is the raw, serde-friendly form read from `pr-rules.toml`.
//! `Rulebook` is the validated form the evaluator runs against, with every
//! pattern compiled once up front.
//!
//! ```toml
//! bigPRThreshold = 600
//! titleMinLength = 4
//! testPathPattern = "test"
//! sourceFileSuffixes = [".rs", ".kt"]
//! botLoginPattern = '\[bot\]$'
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_GUIDANCE_URL: &str =
    "https://www.notion.so/pleo/PR-and-Code-Review-Culture-at-Pleo-220324344eb849f3b636cd00a28b4a41";
pub const DEFAULT_RELEASE_WORKFLOW_URL: &str =
    "https://www.notion.so/pleo/Automated-Releases-235f7cab8e034e74bba375ef7e9caf7c";

/// Rule thresholds and patterns as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RulesConfig {
    /// Diff size (additions + deletions) above which a PR is considered big
    #[serde(rename = "bigPRThreshold")]
    pub big_pr_threshold: u64,
    /// Maximum number of requested reviewer teams before warning
    pub team_reviewers_threshold: usize,
    /// Maximum number of requested individual reviewers before warning
    pub user_reviewers_threshold: usize,
    /// Minimum title length in characters
    pub title_min_length: usize,
    /// Optional pattern every title must match (e.g. `^[A-Z]`)
    pub title_pattern: Option<String>,
    /// Pattern identifying test files among changed paths
    pub test_path_pattern: String,
    /// Suffixes of source files that should come with tests.
    /// Empty means every changed file counts.
    pub source_file_suffixes: Vec<String>,
    /// Minimum commit message length in characters
    pub commit_message_min_length: usize,
    /// Pattern matching automation accounts whose PRs are not checked
    pub bot_login_pattern: String,
    /// Link to the PR guidelines shown when any rule triggers
    pub guidance_url: String,
    /// Link to the release workflow docs shown when labels are missing
    pub release_workflow_url: String,
    /// Mention the PR author in the closing greeting
    pub mention_author: bool,
    /// Upper bound on the draft status lookup
    pub draft_fetch_timeout_ms: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            big_pr_threshold: 600,
            team_reviewers_threshold: 2,
            user_reviewers_threshold: 3,
            title_min_length: 4,
            title_pattern: None,
            test_path_pattern: "test".to_string(),
            source_file_suffixes: [".kt", ".java", ".ts", ".tsx", ".js", ".rs"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            commit_message_min_length: 3,
            bot_login_pattern: r"(?i)(\[bot\]$|^dependabot|^renovate)".to_string(),
            guidance_url: DEFAULT_GUIDANCE_URL.to_string(),
            release_workflow_url: DEFAULT_RELEASE_WORKFLOW_URL.to_string(),
            mention_author: true,
            draft_fetch_timeout_ms: 5_000,
        }
    }
}

impl RulesConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Read and parse a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading rules config");
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    /// Validate the config and compile its patterns
    pub fn compile(self) -> Result<Rulebook> {
        if self.title_min_length == 0 {
            return Err(Error::Config("titleMinLength must be at least 1".into()));
        }
        if self.commit_message_min_length == 0 {
            return Err(Error::Config(
                "commitMessageMinLength must be at least 1".into(),
            ));
        }
        if self.guidance_url.trim().is_empty() {
            return Err(Error::Config("guidanceUrl must not be empty".into()));
        }
        if self.draft_fetch_timeout_ms == 0 {
            return Err(Error::Config("draftFetchTimeoutMs must be positive".into()));
        }

        let title_pattern = self
            .title_pattern
            .as_deref()
            .map(|p| compile_pattern("titlePattern", p))
            .transpose()?;
        let test_path_pattern = compile_pattern("testPathPattern", &self.test_path_pattern)?;
        let bot_login_pattern = compile_pattern("botLoginPattern", &self.bot_login_pattern)?;

        Ok(Rulebook {
            title_pattern,
            test_path_pattern,
            bot_login_pattern,
            config: self,
        })
    }
}

fn compile_pattern(field: &'static str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::Pattern { field, source })
}

/// Validated configuration with compiled patterns
#[derive(Debug, Clone)]
pub struct Rulebook {
    config: RulesConfig,
    title_pattern: Option<Regex>,
    test_path_pattern: Regex,
    bot_login_pattern: Regex,
}

impl Rulebook {
    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn title_pattern(&self) -> Option<&Regex> {
        self.title_pattern.as_ref()
    }

    pub fn test_path_pattern(&self) -> &Regex {
        &self.test_path_pattern
    }

    pub fn bot_login_pattern(&self) -> &Regex {
        &self.bot_login_pattern
    }

    pub fn draft_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.config.draft_fetch_timeout_ms)
    }
}

impl Default for Rulebook {
    fn default() -> Self {
        // The built-in patterns are literals and always compile.
        RulesConfig::default()
            .compile()
            .expect("default rules config is valid")
    }
}
