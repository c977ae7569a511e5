use anyhow::{Context, Result};

use crate::domains::discovery::models::UrlCandidate;
use crate::kernel::ServerDeps;

/// Career pages for a company domain as crawl candidates (priority 1).
pub async fn discover_career_pages(domain: &str, deps: &ServerDeps) -> Result<Vec<UrlCandidate>> {
    let pages = deps
        .osint
        .discover_career_pages(domain)
        .await
        .with_context(|| format!("Failed to discover career pages for {}", domain))?;

    Ok(pages
        .into_iter()
        .map(|page| UrlCandidate::career_page(page.url, domain, page.confidence))
        .collect())
}

/// Job-related subdomains as crawl candidates (priority 2).
pub async fn enumerate_subdomains(domain: &str, deps: &ServerDeps) -> Result<Vec<UrlCandidate>> {
    let subdomains = deps
        .osint
        .enumerate_subdomains(domain)
        .await
        .with_context(|| format!("Failed to enumerate subdomains for {}", domain))?;

    Ok(subdomains
        .iter()
        .map(|host| host.trim())
        .filter(|host| !host.is_empty())
        .map(|host| UrlCandidate::subdomain(host, domain))
        .collect())
}
