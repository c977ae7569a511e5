use anyhow::{Context, Result};
use tracing::debug;

use crate::kernel::ServerDeps;

/// Result URLs for one dork query, blanks dropped.
pub async fn search_dork(query: &str, max_results: usize, deps: &ServerDeps) -> Result<Vec<String>> {
    let urls = deps
        .osint
        .search_dork(query, max_results)
        .await
        .with_context(|| format!("Dork query failed: {}", query))?;

    let urls: Vec<String> = urls
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect();

    debug!(query, results = urls.len(), "Dork query returned");
    Ok(urls)
}
