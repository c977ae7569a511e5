use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::domains::crawling::types::FetchedPage;
use crate::kernel::ServerDeps;

/// Render a page through the crawler, routed via the next available proxy.
///
/// Proxy lookup is best effort: if the proxy manager is down the page is
/// fetched directly.
pub async fn fetch_page(url: &str, deps: &ServerDeps) -> Result<FetchedPage> {
    let proxy = match deps.proxies.next_proxy().await {
        Ok(proxy) => proxy,
        Err(e) => {
            warn!(url = %url, error = %e, "Proxy lookup failed, fetching directly");
            None
        }
    };

    debug!(url = %url, proxied = proxy.is_some(), "Fetching page");

    deps.page_fetcher
        .fetch_page(url, proxy.as_ref())
        .await
        .with_context(|| format!("Failed to fetch {}", url))
}
