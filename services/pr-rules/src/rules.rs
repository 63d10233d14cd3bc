//! Rule Evaluator
//!
//! Runs every rule against a PR snapshot and collects the outcomes in a
//! fixed order. Rules never short-circuit each other; only the bot bypass
//! stops evaluation, and it is checked before anything else.

use tracing::debug;

use crate::config::Rulebook;
use crate::draft::{resolve_draft, DraftStatusSource};
use crate::outcome::{Bypass, Evaluation, RuleId, RuleOutcome};
use crate::predicates;
use crate::snapshot::{FileChangeSet, PullRequestSnapshot};

/// Evaluate all rules against a snapshot
///
/// Pure function of its inputs. A draft flag that is still unknown counts as
/// not-draft; use [`crate::draft::resolve_draft`] beforehand to look it up.
pub fn evaluate(
    pr: &PullRequestSnapshot,
    changes: &FileChangeSet,
    rulebook: &Rulebook,
) -> Evaluation {
    if predicates::is_bot_login(pr.author.as_deref(), rulebook.bot_login_pattern()) {
        let login = pr.author.clone().unwrap_or_default();
        debug!(login = %login, "Author is an automation account, skipping rules");
        return Evaluation::bypassed(Bypass::Bot { login });
    }

    let draft = pr.is_draft();
    let config = rulebook.config();
    let mut outcomes = Vec::new();

    if pr.labels.is_empty() {
        outcomes.push(RuleOutcome::note(
            RuleId::Labels,
            format!(
                "This PR is not labeled.\n\n\
                 If this repository is released using our \
                 [🚤 Automated Release workflow]({}), labels are required in order to ship a release.",
                config.release_workflow_url
            ),
        ));
    }

    if !draft && pr.body.is_empty() {
        outcomes.push(RuleOutcome::fail(
            RuleId::Description,
            "This PR does not include a description.\n\n\
             Giving PRs even a short description makes it easier for reviewers to \
             contextualize the changes in the PR.",
        ));
    }

    if predicates::title_needs_work(&pr.title, config.title_min_length, rulebook.title_pattern()) {
        outcomes.push(RuleOutcome::warn(
            RuleId::Title,
            "This PR does not have a descriptive title.\n\n\
             Giving PRs a well-formatted title makes it easy for reviewers to get an overview \
             of the changes in the PR and makes it easy to maintain a CHANGELOG.",
        ));
    }

    if !draft && predicates::exceeds_threshold(pr.diff_size(), config.big_pr_threshold) {
        outcomes.push(RuleOutcome::warn(
            RuleId::DiffSize,
            format!(
                "This PR has more than {} changes.\n\n\
                 Keeping PRs small makes it easier for reviewers to give faster in-depth quality \
                 reviews and makes it easier to catch potential bugs.",
                config.big_pr_threshold
            ),
        ));
    }

    let missing_tests = !predicates::touches_tests(changes.touched(), rulebook.test_path_pattern())
        && predicates::touches_sources(changes.touched(), &config.source_file_suffixes);
    if missing_tests {
        outcomes.push(RuleOutcome::warn(
            RuleId::Tests,
            "This PR does not add or modify tests.",
        ));
        if pr.has_requested_reviewers() {
            outcomes.push(RuleOutcome::note(
                RuleId::TestsBeforeReview,
                "This PR has assigned reviewers, but does not add tests.\n\n\
                 Testing PR changes before requesting a review leads to faster in-depth quality \
                 reviews and makes it easier to catch potential bugs.",
            ));
        }
    }

    if predicates::has_short_commit_message(&pr.commits, config.commit_message_min_length) {
        outcomes.push(RuleOutcome::note(
            RuleId::CommitMessages,
            "This PR has commits with short messages.\n\n\
             Ensuring PRs have descriptive commit messages allow reviewers to get an overview \
             of the changes and leads to faster reviews.",
        ));
    }

    if pr.requested_teams.len() > config.team_reviewers_threshold {
        outcomes.push(RuleOutcome::warn(
            RuleId::TeamReviewers,
            format!(
                "This PR has more than {0} teams assigned.\n\n\
                 Assigning more than {0} teams to PRs leads to confusion around who is \
                 responsible for reviewing the PR and longer review times.",
                config.team_reviewers_threshold
            ),
        ));
    }

    if pr.requested_users.len() > config.user_reviewers_threshold {
        outcomes.push(RuleOutcome::warn(
            RuleId::UserReviewers,
            format!(
                "This PR has more than {0} individual reviewers assigned.\n\n\
                 Assigning more than {0} reviewers to PRs leads to confusion around who is \
                 responsible for reviewing the PR and longer review times.",
                config.user_reviewers_threshold
            ),
        ));
    }

    if !pr.has_requested_reviewers() {
        outcomes.push(RuleOutcome::note(
            RuleId::NoReviewers,
            "This PR has no assigned reviewers.\n\n\
             Team members and CODEOWNERS can be assigned to get knowledgeable feedback on changes.",
        ));
    }

    for outcome in &outcomes {
        debug!(rule = %outcome.rule, severity = %outcome.severity(), "Rule triggered");
    }

    let mut closing = vec![greeting(pr, config.mention_author)];
    if !outcomes.is_empty() {
        closing.push(format!(
            "If you are in doubt why this appears, [check out our PR guidelines]({})! 📚",
            config.guidance_url
        ));
    }

    Evaluation {
        outcomes,
        closing,
        bypass: None,
    }
}

/// Resolve the draft flag through `source` when unknown, then evaluate
pub async fn evaluate_with_lookup(
    pr: PullRequestSnapshot,
    changes: &FileChangeSet,
    rulebook: &Rulebook,
    source: Option<&dyn DraftStatusSource>,
) -> Evaluation {
    if predicates::is_bot_login(pr.author.as_deref(), rulebook.bot_login_pattern()) {
        return evaluate(&pr, changes, rulebook);
    }
    let draft = resolve_draft(&pr, source, rulebook.draft_fetch_timeout()).await;
    evaluate(&pr.with_draft(draft), changes, rulebook)
}

fn greeting(pr: &PullRequestSnapshot, mention_author: bool) -> String {
    match pr.author.as_deref().filter(|login| !login.is_empty()) {
        Some(login) if mention_author => format!("Good work @{}! ❤️", login),
        _ => "Good work! ❤️".to_string(),
    }
}
