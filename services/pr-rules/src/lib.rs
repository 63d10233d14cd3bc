//! Pull Request Review Rules
//!
//! Checks a pull request's metadata against a fixed list of review rules
//! and reports blocking failures, warnings and notes.
//!
//! ## Rules
//!
//! In evaluation order:
//!
//! - Automation accounts (`botLoginPattern`) are skipped entirely
//! - Drafts skip the description and diff size rules
//! - Missing labels (note), empty description (fail), short title (warn)
//! - Big diffs (warn), source changes without tests (warn)
//! - Short commit messages (note)
//! - Too many reviewer teams or users (warn), no reviewers (note)
//!
//! Only failures block a merge; the `pr-rules` binary exits non-zero when
//! one is reported.
//!
//! ## Example Pipeline
//!
//! ```bash
//! # Check a PR and update the review comment
//! pr-rules \
//!   --repo lornu-ai/lornu.ai \
//!   --token $GITHUB_TOKEN \
//!   --pr-number 123 \
//!   --comment
//!
//! # Check an exported event offline
//! pr-rules --event pr.json --format json
//! ```

pub mod auth;
pub mod config;
pub mod draft;
pub mod error;
pub mod github;
pub mod outcome;
pub mod predicates;
pub mod report;
pub mod rules;
pub mod snapshot;

pub use config::{Rulebook, RulesConfig};
pub use draft::{resolve_draft, DraftStatusSource};
pub use error::{Error, Result};
pub use github::{GitHubClient, PullRequestRef};
pub use outcome::{Evaluation, Outcome, RuleId, RuleOutcome, Severity};
pub use report::{deliver, Reporter};
pub use rules::{evaluate, evaluate_with_lookup};
pub use snapshot::{FileChangeSet, PullRequestEvent, PullRequestSnapshot};
