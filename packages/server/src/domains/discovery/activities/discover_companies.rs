use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::domains::companies::{CompanyCandidate, DiscoverySource};
use crate::kernel::ServerDeps;

/// Companies matching `query` from a single source, capped at `max_results`.
///
/// A manual seed for a company that is already stored keeps its stored
/// display name and description instead of falling back to the bare domain.
pub async fn discover_companies(
    source: DiscoverySource,
    query: &str,
    max_results: usize,
    deps: &ServerDeps,
) -> Result<Vec<CompanyCandidate>> {
    if source == DiscoverySource::Manual {
        let domain = query.trim().to_lowercase();
        if let Some(company) = deps.store.find_company(&domain).await? {
            debug!(domain = %domain, name = %company.name, "Reusing stored company");
            return Ok(vec![CompanyCandidate::from(company)]);
        }
    }

    let mut companies = deps
        .osint
        .discover_companies(source, query, max_results)
        .await
        .with_context(|| format!("Failed to discover companies from {}", source.as_str()))?;

    companies.retain(|company| !company.domain.trim().is_empty());
    companies.truncate(max_results);

    info!(source = source.as_str(), query, count = companies.len(), "Discovered companies");
    Ok(companies)
}
