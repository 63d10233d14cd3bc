//! Reporting
//!
//! Delivers an [`Evaluation`] to an output: one call per outcome, then one
//! final call with the closing messages. A reporter error is fatal; it means
//! the output itself is broken, not that a rule misfired.

use async_trait::async_trait;
use serde::Serialize;
use std::io::Write;

use crate::error::{Error, Result};
use crate::github::{GitHubClient, PullRequestRef, COMMENT_MARKER};
use crate::outcome::{Evaluation, RuleOutcome, Severity};

/// Output sink for rule outcomes
#[async_trait]
pub trait Reporter: Send {
    /// Called once per outcome, in rule order
    async fn report(&mut self, outcome: &RuleOutcome) -> Result<()>;

    /// Called once after all outcomes with the closing markdown
    async fn finish(&mut self, closing: &[String]) -> Result<()>;
}

/// Feed an evaluation through a reporter
///
/// A bypassed evaluation produces no calls at all.
pub async fn deliver(evaluation: &Evaluation, reporter: &mut dyn Reporter) -> Result<()> {
    if evaluation.bypass.is_some() {
        return Ok(());
    }
    for outcome in &evaluation.outcomes {
        reporter.report(outcome).await?;
    }
    reporter.finish(&evaluation.closing).await
}

fn icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Fail => "🚫",
        Severity::Warn => "⚠️",
        Severity::Note => "📖",
    }
}

fn write_err(e: std::io::Error) -> Error {
    Error::Report(e.to_string())
}

// ============================================================
// Console
// ============================================================

/// Plain text lines, one block per outcome
pub struct ConsoleReporter<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    async fn report(&mut self, outcome: &RuleOutcome) -> Result<()> {
        writeln!(
            self.out,
            "{} {} [{}] {}",
            icon(outcome.severity()),
            outcome.severity(),
            outcome.rule,
            outcome.message().replace('\n', "\n    ")
        )
        .map_err(write_err)
    }

    async fn finish(&mut self, closing: &[String]) -> Result<()> {
        for line in closing {
            writeln!(self.out, "{}", line).map_err(write_err)?;
        }
        self.out.flush().map_err(write_err)
    }
}

// ============================================================
// JSON
// ============================================================

#[derive(Debug, Serialize)]
struct Summary<'a> {
    pull_request: Option<&'a PullRequestRef>,
    blocking: bool,
    failures: usize,
    warnings: usize,
    notes: usize,
    outcomes: &'a [RuleOutcome],
    closing: &'a [String],
}

/// Collects outcomes and writes one JSON summary on finish
pub struct JsonReporter<W: Write + Send> {
    out: W,
    pull_request: Option<PullRequestRef>,
    outcomes: Vec<RuleOutcome>,
}

impl<W: Write + Send> JsonReporter<W> {
    pub fn new(out: W, pull_request: Option<PullRequestRef>) -> Self {
        Self {
            out,
            pull_request,
            outcomes: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: Write + Send> Reporter for JsonReporter<W> {
    async fn report(&mut self, outcome: &RuleOutcome) -> Result<()> {
        self.outcomes.push(outcome.clone());
        Ok(())
    }

    async fn finish(&mut self, closing: &[String]) -> Result<()> {
        let count = |severity: Severity| {
            self.outcomes
                .iter()
                .filter(|o| o.severity() == severity)
                .count()
        };
        let summary = Summary {
            pull_request: self.pull_request.as_ref(),
            blocking: count(Severity::Fail) > 0,
            failures: count(Severity::Fail),
            warnings: count(Severity::Warn),
            notes: count(Severity::Note),
            outcomes: &self.outcomes,
            closing,
        };
        let json = serde_json::to_string_pretty(&summary)?;
        writeln!(self.out, "{}", json).map_err(write_err)?;
        self.out.flush().map_err(write_err)
    }
}

// ============================================================
// PR comment
// ============================================================

/// Render outcomes and closing messages as the PR comment body
pub fn render_comment(outcomes: &[RuleOutcome], closing: &[String]) -> String {
    let mut body = String::from(COMMENT_MARKER);
    body.push('\n');

    for (severity, singular, plural) in [
        (Severity::Fail, "Fail", "Fails"),
        (Severity::Warn, "Warning", "Warnings"),
        (Severity::Note, "Message", "Messages"),
    ] {
        let matching: Vec<_> = outcomes
            .iter()
            .filter(|o| o.severity() == severity)
            .collect();
        if matching.is_empty() {
            continue;
        }
        let title = if matching.len() == 1 { singular } else { plural };
        body.push_str(&format!("\n| | {} {} |\n|---|---|\n", matching.len(), title));
        for outcome in matching {
            body.push_str(&format!(
                "| {} | {} |\n",
                icon(severity),
                table_cell(outcome.message())
            ));
        }
    }

    for line in closing {
        body.push('\n');
        body.push_str(line);
        body.push('\n');
    }
    body
}

fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', "<br>")
}

/// Posts a single comment on the PR, replacing the previous run's comment
pub struct CommentReporter<'a> {
    client: &'a GitHubClient,
    pr: &'a PullRequestRef,
    outcomes: Vec<RuleOutcome>,
}

impl<'a> CommentReporter<'a> {
    pub fn new(client: &'a GitHubClient, pr: &'a PullRequestRef) -> Self {
        Self {
            client,
            pr,
            outcomes: Vec::new(),
        }
    }
}

#[async_trait]
impl Reporter for CommentReporter<'_> {
    async fn report(&mut self, outcome: &RuleOutcome) -> Result<()> {
        self.outcomes.push(outcome.clone());
        Ok(())
    }

    async fn finish(&mut self, closing: &[String]) -> Result<()> {
        let body = render_comment(&self.outcomes, closing);
        self.client
            .upsert_comment(self.pr, &body)
            .await
            .map(|_| ())
            .map_err(|e| Error::Report(e.to_string()))
    }
}
