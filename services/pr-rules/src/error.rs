//! Error types for rule configuration, GitHub access and reporting

use thiserror::Error;

/// Errors that can occur while loading rules, talking to GitHub or reporting
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A configured pattern failed to compile
    #[error("Invalid pattern for {field}: {source}")]
    Pattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Reading a local file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot or API payload was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// GitHub API request failed
    #[error("GitHub API error: {0}")]
    GitHub(String),

    /// GitHub App authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The output sink rejected a message. Always fatal.
    #[error("Failed to report results: {0}")]
    Report(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::GitHub(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
