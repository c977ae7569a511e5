use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::http::{build_client, ensure_success};
use super::BaseOsintClient;
use crate::common::extract_domain;
use crate::domains::companies::{CompanyCandidate, DiscoverySource};
use crate::domains::discovery::models::{CareerPage, PlatformDetection};

/// Client for the OSINT discovery service.
pub struct OsintClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Serialize)]
struct DomainRequest<'a> {
    domain: &'a str,
}

#[derive(Debug, Serialize)]
struct UrlRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct CodeHostResponse {
    #[serde(default)]
    companies: Vec<CodeHostCompany>,
}

#[derive(Debug, Deserialize)]
struct CodeHostCompany {
    name: String,
    domain: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DorkResponse {
    #[serde(default)]
    urls: Vec<DorkHit>,
}

#[derive(Debug, Deserialize)]
struct DorkHit {
    url: String,
    #[serde(default)]
    domain: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CareerPagesResponse {
    #[serde(default)]
    career_pages: Vec<CareerPage>,
}

#[derive(Debug, Deserialize)]
struct SubdomainsResponse {
    #[serde(default)]
    subdomains: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AtsResponse {
    #[serde(default)]
    is_ats: bool,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    confidence: f64,
}

impl OsintClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
        })
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to call OSINT service {}", path))?;

        ensure_success("osint", response)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse OSINT response from {}", path))
    }

    async fn dork(&self, query: &str, max_results: usize) -> Result<Vec<DorkHit>> {
        let response: DorkResponse = self
            .post("/discover/google-dork", &SearchRequest { query, max_results })
            .await?;
        Ok(response.urls)
    }
}

#[async_trait]
impl BaseOsintClient for OsintClient {
    async fn discover_companies(
        &self,
        source: DiscoverySource,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<CompanyCandidate>> {
        match source {
            DiscoverySource::Manual => Ok(vec![CompanyCandidate::seed(query)]),
            DiscoverySource::CodeHost => {
                let response: CodeHostResponse = self
                    .post("/discover/github", &SearchRequest { query, max_results })
                    .await?;

                Ok(response
                    .companies
                    .into_iter()
                    .map(|c| CompanyCandidate {
                        name: c.name,
                        domain: c.domain,
                        description: c.description.filter(|d| !d.trim().is_empty()),
                        source: DiscoverySource::CodeHost,
                    })
                    .collect())
            }
            DiscoverySource::SearchDork => {
                // One company per result domain, in first-seen order.
                let mut seen = HashSet::new();
                let companies = self
                    .dork(query, max_results)
                    .await?
                    .into_iter()
                    .filter_map(|hit| hit.domain.or_else(|| extract_domain(&hit.url)))
                    .filter(|domain| seen.insert(domain.clone()))
                    .map(|domain| CompanyCandidate {
                        name: domain.clone(),
                        domain,
                        description: None,
                        source: DiscoverySource::SearchDork,
                    })
                    .collect();
                Ok(companies)
            }
        }
    }

    async fn discover_career_pages(&self, domain: &str) -> Result<Vec<CareerPage>> {
        let response: CareerPagesResponse = self
            .post("/discover/career-pages", &DomainRequest { domain })
            .await?;
        Ok(response.career_pages)
    }

    async fn enumerate_subdomains(&self, domain: &str) -> Result<Vec<String>> {
        let response: SubdomainsResponse = self
            .post("/discover/subdomains", &DomainRequest { domain })
            .await?;
        Ok(response.subdomains)
    }

    async fn detect_platform(&self, url: &str) -> Result<PlatformDetection> {
        let response: AtsResponse = self.post("/detect/ats", &UrlRequest { url }).await?;
        Ok(PlatformDetection {
            is_ats: response.is_ats,
            platform: response.platform.filter(|p| !p.is_empty()),
            confidence: response.confidence,
        })
    }

    async fn search_dork(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        Ok(self
            .dork(query, max_results)
            .await?
            .into_iter()
            .map(|hit| hit.url)
            .collect())
    }
}
