//! Draft Status Lookup
//!
//! The host does not always say whether a PR is a draft. When it does not,
//! the status is fetched once before evaluation, bounded by a timeout. Any
//! failure falls back to "not a draft" so the description and size rules
//! still run.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Result;
use crate::snapshot::PullRequestSnapshot;

/// Something that can tell whether a PR is a draft
#[async_trait]
pub trait DraftStatusSource: Send + Sync {
    async fn is_draft(&self) -> Result<bool>;
}

/// Determine the draft flag for a snapshot
///
/// Returns the snapshot's own flag when present. Otherwise asks `source`
/// once; errors, timeouts and a missing source all resolve to `false`.
pub async fn resolve_draft(
    pr: &PullRequestSnapshot,
    source: Option<&dyn DraftStatusSource>,
    timeout: Duration,
) -> bool {
    if let Some(draft) = pr.draft {
        return draft;
    }
    let Some(source) = source else {
        debug!("No draft status source, treating PR as ready for review");
        return false;
    };

    match tokio::time::timeout(timeout, source.is_draft()).await {
        Ok(Ok(draft)) => {
            debug!(draft, "Fetched draft status");
            draft
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Draft status lookup failed, treating PR as ready for review");
            false
        }
        Err(_) => {
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "Draft status lookup timed out, treating PR as ready for review"
            );
            false
        }
    }
}
