use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{build_client, ensure_success};
use super::{BasePageFetcher, Proxy};
use crate::domains::crawling::types::FetchedPage;

/// Client for the headless crawler service (`POST /crawl`).
pub struct CrawlerClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CrawlRequest<'a> {
    url: &'a str,
    use_stealth: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxy_url: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CrawlResponse {
    url: String,
    #[serde(default)]
    html: String,
    #[serde(default)]
    status: u16,
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

impl CrawlerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl BasePageFetcher for CrawlerClient {
    async fn fetch_page(&self, url: &str, proxy: Option<&Proxy>) -> Result<FetchedPage> {
        let request = CrawlRequest {
            url,
            use_stealth: true,
            proxy_url: proxy.map(|p| p.url.as_str()),
        };

        let response = self
            .client
            .post(format!("{}/crawl", self.base_url))
            .json(&request)
            .send()
            .await
            .context("Failed to call crawler service")?;

        let crawled: CrawlResponse = ensure_success("crawler", response)
            .await?
            .json()
            .await
            .context("Failed to parse crawler response")?;

        if !crawled.success {
            anyhow::bail!(
                "Crawl of {} unsuccessful: {}",
                crawled.url,
                crawled.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }

        Ok(FetchedPage {
            url: crawled.url,
            html: crawled.html,
            status: crawled.status,
        })
    }
}
