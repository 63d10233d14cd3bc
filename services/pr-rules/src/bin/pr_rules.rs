//! PR Review Rules
//!
//! Evaluates the review rules against a pull request and reports the result
//! on stdout and, optionally, as a PR comment.
//!
//! ## Usage
//! ```bash
//! # Check a PR with a token
//! pr-rules \
//!   --repo lornu-ai/lornu.ai \
//!   --token <TOKEN> \
//!   --pr-number 123
//!
//! # Post the result as a comment using GitHub App credentials
//! pr-rules \
//!   --repo lornu-ai/lornu.ai \
//!   --app-id 123456 \
//!   --private-key-path ./key.pem \
//!   --installation-id 78901234 \
//!   --pr-number 123 \
//!   --comment
//!
//! # Offline, from an exported event
//! pr-rules --event pr.json --config pr-rules.toml --format json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pr_rules::auth::{installation_token, AppCredentials};
use pr_rules::github::{DraftLookup, DEFAULT_API_URL};
use pr_rules::outcome::{Bypass, Severity};
use pr_rules::report::{CommentReporter, ConsoleReporter, JsonReporter};
use pr_rules::{
    deliver, evaluate_with_lookup, DraftStatusSource, GitHubClient, PullRequestEvent,
    PullRequestRef, RulesConfig,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// PR Review Rules
#[derive(Parser, Debug)]
#[command(name = "pr-rules")]
#[command(about = "Check pull requests against the review rules")]
#[command(version)]
struct Args {
    /// Repository in format owner/repo
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repo: Option<String>,

    /// PR number to check
    #[arg(long, env = "PR_NUMBER")]
    pr_number: Option<u64>,

    /// GitHub token (installation token or PAT)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub App ID, used when no token is given
    #[arg(long, env = "GITHUB_APP_ID", requires_all = ["private_key_path", "installation_id"])]
    app_id: Option<String>,

    /// Path to the GitHub App private key PEM file
    #[arg(long, env = "GITHUB_PRIVATE_KEY_PATH")]
    private_key_path: Option<PathBuf>,

    /// GitHub App Installation ID
    #[arg(long, env = "GITHUB_INSTALLATION_ID")]
    installation_id: Option<u64>,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Read the PR snapshot from a JSON event file instead of the API
    #[arg(long)]
    event: Option<PathBuf>,

    /// Rules config file (TOML)
    #[arg(long, env = "PR_RULES_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Post (or update) the result as a PR comment
    #[arg(long)]
    comment: bool,

    /// Log format
    #[arg(long, value_enum, default_value = "text", env = "LOG_FORMAT")]
    log_format: LogFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(args: &Args) {
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match args.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn resolve_token(args: &Args) -> Result<Option<String>> {
    if let Some(token) = &args.token {
        return Ok(Some(token.clone()));
    }
    let (Some(app_id), Some(key_path), Some(installation_id)) = (
        args.app_id.as_ref(),
        args.private_key_path.as_ref(),
        args.installation_id,
    ) else {
        return Ok(None);
    };

    let private_key_pem = std::fs::read(key_path)
        .with_context(|| format!("Failed to read private key: {}", key_path.display()))?;
    let credentials = AppCredentials {
        app_id: app_id.clone(),
        installation_id,
        private_key_pem,
    };
    let token = installation_token(&args.api_url, &credentials)
        .await
        .context("Failed to obtain installation token")?;
    Ok(Some(token))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let rulebook = match &args.config {
        Some(path) => RulesConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => RulesConfig::default(),
    }
    .compile()
    .context("Invalid rules config")?;

    let pr_ref = match (&args.repo, args.pr_number) {
        (Some(repo), Some(number)) => Some(PullRequestRef::parse(repo, number)?),
        _ => None,
    };

    let client = match &pr_ref {
        Some(_) => resolve_token(&args)
            .await?
            .map(|token| GitHubClient::new(&args.api_url, token))
            .transpose()?,
        None => None,
    };

    let PullRequestEvent { pr, changes } = match (&args.event, &client, &pr_ref) {
        (Some(path), _, _) => PullRequestEvent::load(path)
            .with_context(|| format!("Failed to read event: {}", path.display()))?,
        (None, Some(client), Some(pr_ref)) => {
            let (pr, changes) = client
                .fetch_snapshot(pr_ref)
                .await
                .context("Failed to fetch pull request")?;
            PullRequestEvent { pr, changes }
        }
        _ => anyhow::bail!(
            "Either --event or --repo, --pr-number and GitHub credentials must be specified"
        ),
    };

    let lookup = client
        .as_ref()
        .zip(pr_ref.as_ref())
        .map(|(client, pr_ref)| DraftLookup::new(client, pr_ref));
    let evaluation = evaluate_with_lookup(
        pr,
        &changes,
        &rulebook,
        lookup.as_ref().map(|l| l as &dyn DraftStatusSource),
    )
    .await;

    if let Some(Bypass::Bot { login }) = &evaluation.bypass {
        info!(login = %login, "PR opened by an automation account, nothing to check");
    }

    match args.format {
        OutputFormat::Text => {
            let mut console = ConsoleReporter::new(std::io::stdout());
            deliver(&evaluation, &mut console).await?;
        }
        OutputFormat::Json => {
            let mut json = JsonReporter::new(std::io::stdout(), pr_ref.clone());
            deliver(&evaluation, &mut json).await?;
        }
    }

    if args.comment {
        match (&client, &pr_ref) {
            (Some(client), Some(pr_ref)) => {
                let mut comment = CommentReporter::new(client, pr_ref);
                deliver(&evaluation, &mut comment).await?;
            }
            _ => warn!("--comment needs --repo, --pr-number and GitHub credentials; skipping"),
        }
    }

    info!(
        failures = evaluation.count(Severity::Fail),
        warnings = evaluation.count(Severity::Warn),
        notes = evaluation.count(Severity::Note),
        "Review rules evaluated"
    );

    // Failures block the merge
    if evaluation.is_blocking() {
        std::process::exit(1);
    }

    Ok(())
}
