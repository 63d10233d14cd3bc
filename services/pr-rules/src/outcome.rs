//! Rule Outcomes
//!
//! Types describing what the rules found for a single PR.

use serde::{Deserialize, Serialize};

/// Identifies the rule that produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    Labels,
    Description,
    Title,
    DiffSize,
    Tests,
    TestsBeforeReview,
    CommitMessages,
    TeamReviewers,
    UserReviewers,
    NoReviewers,
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RuleId::Labels => "labels",
            RuleId::Description => "description",
            RuleId::Title => "title",
            RuleId::DiffSize => "diff_size",
            RuleId::Tests => "tests",
            RuleId::TestsBeforeReview => "tests_before_review",
            RuleId::CommitMessages => "commit_messages",
            RuleId::TeamReviewers => "team_reviewers",
            RuleId::UserReviewers => "user_reviewers",
            RuleId::NoReviewers => "no_reviewers",
        };
        write!(f, "{}", name)
    }
}

/// Severity of a triggered rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only
    Note,
    /// Advisory
    Warn,
    /// Blocks merge
    Fail,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warn => write!(f, "warn"),
            Severity::Fail => write!(f, "fail"),
        }
    }
}

/// A message emitted by a triggered rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "severity", content = "message", rename_all = "lowercase")]
pub enum Outcome {
    Fail(String),
    Warn(String),
    Note(String),
}

impl Outcome {
    pub fn severity(&self) -> Severity {
        match self {
            Outcome::Fail(_) => Severity::Fail,
            Outcome::Warn(_) => Severity::Warn,
            Outcome::Note(_) => Severity::Note,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Outcome::Fail(message) | Outcome::Warn(message) | Outcome::Note(message) => message,
        }
    }
}

/// An outcome together with the rule that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: RuleId,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl RuleOutcome {
    pub fn fail(rule: RuleId, message: impl Into<String>) -> Self {
        Self {
            rule,
            outcome: Outcome::Fail(message.into()),
        }
    }

    pub fn warn(rule: RuleId, message: impl Into<String>) -> Self {
        Self {
            rule,
            outcome: Outcome::Warn(message.into()),
        }
    }

    pub fn note(rule: RuleId, message: impl Into<String>) -> Self {
        Self {
            rule,
            outcome: Outcome::Note(message.into()),
        }
    }

    pub fn severity(&self) -> Severity {
        self.outcome.severity()
    }

    pub fn message(&self) -> &str {
        self.outcome.message()
    }
}

/// Why evaluation stopped before running any rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum Bypass {
    /// The PR was opened by an automation account
    Bot { login: String },
}

/// Result of evaluating every rule against one PR
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Triggered rules in rule order
    pub outcomes: Vec<RuleOutcome>,
    /// Closing markdown: the greeting, then the guideline link when needed
    pub closing: Vec<String>,
    /// Set when the rules were skipped entirely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bypass: Option<Bypass>,
}

impl Evaluation {
    /// An evaluation that ran no rules
    pub fn bypassed(bypass: Bypass) -> Self {
        Self {
            outcomes: Vec::new(),
            closing: Vec::new(),
            bypass: Some(bypass),
        }
    }

    /// True iff at least one rule triggered
    pub fn guidance_needed(&self) -> bool {
        !self.outcomes.is_empty()
    }

    /// True iff any outcome is a Fail
    pub fn is_blocking(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| outcome.severity() == Severity::Fail)
    }

    /// Number of outcomes with the given severity
    pub fn count(&self, severity: Severity) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.severity() == severity)
            .count()
    }

    /// Outcomes produced by a specific rule
    pub fn by_rule(&self, rule: RuleId) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(move |outcome| outcome.rule == rule)
    }
}
