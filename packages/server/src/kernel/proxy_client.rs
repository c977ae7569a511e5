use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::http::{build_client, ensure_success};
use super::{BaseProxyProvider, Proxy};

/// Client for the proxy manager's rotation endpoint.
pub struct ProxyManagerClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ProxyResponse {
    url: String,
    #[serde(default)]
    protocol: Option<String>,
}

impl ProxyManagerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl BaseProxyProvider for ProxyManagerClient {
    async fn next_proxy(&self) -> Result<Option<Proxy>> {
        let response = self
            .client
            .get(format!("{}/api/v1/proxy/next", self.base_url))
            .send()
            .await
            .context("Failed to call proxy manager")?;

        // No healthy proxies in the pool.
        if matches!(
            response.status(),
            StatusCode::NOT_FOUND | StatusCode::SERVICE_UNAVAILABLE
        ) {
            return Ok(None);
        }

        let proxy: ProxyResponse = ensure_success("proxy-manager", response)
            .await?
            .json()
            .await
            .context("Failed to parse proxy manager response")?;

        Ok(Some(Proxy {
            url: proxy.url,
            protocol: proxy.protocol,
        }))
    }
}

/// Direct connections only; used when no proxy manager is configured.
pub struct NoopProxyProvider;

#[async_trait]
impl BaseProxyProvider for NoopProxyProvider {
    async fn next_proxy(&self) -> Result<Option<Proxy>> {
        Ok(None)
    }
}
