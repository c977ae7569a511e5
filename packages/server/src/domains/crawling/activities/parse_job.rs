use anyhow::{Context, Result};
use tracing::debug;

use crate::domains::crawling::types::{JobLink, ParseOutcome};
use crate::kernel::ServerDeps;

/// Links to individual postings on a career page, deduplicated by URL in
/// page order.
pub async fn extract_job_links(url: &str, html: &str, deps: &ServerDeps) -> Result<Vec<JobLink>> {
    let links = deps
        .job_parser
        .extract_job_links(url, html)
        .await
        .with_context(|| format!("Failed to extract job links from {}", url))?;

    let mut seen = std::collections::HashSet::new();
    let links: Vec<JobLink> = links
        .into_iter()
        .filter(|link| !link.url.trim().is_empty() && seen.insert(link.url.clone()))
        .collect();

    debug!(url = %url, links = links.len(), "Extracted job links");
    Ok(links)
}

pub async fn parse_job(url: &str, html: &str, deps: &ServerDeps) -> Result<ParseOutcome> {
    deps.job_parser
        .parse_job(url, html)
        .await
        .with_context(|| format!("Failed to parse job page {}", url))
}
