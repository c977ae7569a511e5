use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::domains::companies::CompanyCandidate;
use crate::domains::discovery::models::UrlCandidate;
use crate::kernel::ServerDeps;

/// Register discovered companies so later runs can find them stale.
pub async fn store_companies(
    companies: &[CompanyCandidate],
    discovered_at: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<usize> {
    let stored = deps
        .store
        .persist_companies(companies, discovered_at)
        .await
        .context("Failed to persist companies")?;

    info!(submitted = companies.len(), stored, "Stored companies");
    Ok(stored)
}

/// Queue URLs for crawling. Re-queuing a known URL only raises its
/// confidence and priority.
pub async fn store_urls(urls: &[UrlCandidate], deps: &ServerDeps) -> Result<usize> {
    let queued = deps
        .store
        .persist_urls(urls)
        .await
        .context("Failed to queue discovered URLs")?;

    info!(submitted = urls.len(), queued, "Queued discovered URLs");
    Ok(queued)
}
