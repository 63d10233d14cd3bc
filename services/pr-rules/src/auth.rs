//! GitHub App Authentication
//!
//! Mints a short-lived installation token so the review comment is posted by
//! the app's bot account instead of a personal token.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::error::{Error, Result};

/// JWT claims for GitHub App authentication
#[derive(Debug, Serialize)]
pub struct GitHubAppClaims {
    /// Issued at time (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issuer (GitHub App ID)
    pub iss: String,
}

impl GitHubAppClaims {
    fn new(app_id: &str, now: u64) -> Self {
        Self {
            iat: now.saturating_sub(60), // clock skew
            exp: now + 600,
            iss: app_id.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InstallationToken {
    token: String,
}

/// GitHub App credentials
#[derive(Debug, Clone)]
pub struct AppCredentials {
    pub app_id: String,
    pub installation_id: u64,
    pub private_key_pem: Vec<u8>,
}

/// Generate a JWT for GitHub App authentication, valid for 10 minutes
pub fn generate_jwt(app_id: &str, private_key_pem: &[u8]) -> Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Auth(format!("Failed to get current time: {}", e)))?
        .as_secs();

    let encoding_key = EncodingKey::from_rsa_pem(private_key_pem)
        .map_err(|e| Error::Auth(format!("Failed to parse private key: {}", e)))?;

    encode(
        &Header::new(Algorithm::RS256),
        &GitHubAppClaims::new(app_id, now),
        &encoding_key,
    )
    .map_err(|e| Error::Auth(format!("Failed to encode JWT: {}", e)))
}

/// Exchange app credentials for an installation access token
pub async fn installation_token(api_url: &str, credentials: &AppCredentials) -> Result<String> {
    let jwt = generate_jwt(&credentials.app_id, &credentials.private_key_pem)?;
    let url = format!(
        "{}/app/installations/{}/access_tokens",
        api_url.trim_end_matches('/'),
        credentials.installation_id
    );
    debug!(installation_id = credentials.installation_id, "Requesting installation token");

    let response = Client::new()
        .post(&url)
        .bearer_auth(jwt)
        .header("Accept", "application/vnd.github+json")
        .header("User-Agent", "lornu-ai-pr-rules")
        .header("X-GitHub-Api-Version", "2022-11-28")
        .send()
        .await
        .map_err(|e| Error::Auth(format!("Token request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Auth(format!("GitHub API error ({}): {}", status, body)));
    }

    let token: InstallationToken = response
        .json()
        .await
        .map_err(|e| Error::Auth(format!("Failed to parse installation token: {}", e)))?;
    Ok(token.token)
}
