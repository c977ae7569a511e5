use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::domains::companies::Company;
use crate::kernel::ServerDeps;

/// Active companies whose last discovery predates `cutoff`.
pub async fn get_stale_companies(cutoff: DateTime<Utc>, deps: &ServerDeps) -> Result<Vec<Company>> {
    let companies = deps
        .store
        .find_stale_companies(cutoff)
        .await
        .context("Failed to load stale companies")?;

    info!(cutoff = %cutoff, count = companies.len(), "Found stale companies");
    Ok(companies)
}

pub async fn touch_company(domain: &str, at: DateTime<Utc>, deps: &ServerDeps) -> Result<()> {
    deps.store
        .touch_company_discovered(domain, at)
        .await
        .with_context(|| format!("Failed to touch company {}", domain))
}
