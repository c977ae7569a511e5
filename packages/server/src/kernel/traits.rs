// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no orchestration logic.
// Orchestration lives in domains/*/workflows and calls these through activities.
//
// Naming convention: Base* for trait names (e.g., BasePageFetcher, BaseStore)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::companies::{Company, CompanyCandidate, DiscoverySource};
use crate::domains::crawling::types::{FetchedPage, JobLink, ParseOutcome};
use crate::domains::discovery::models::{CareerPage, PlatformDetection, UrlCandidate};
use crate::domains::jobs::{Job, ParsedJob};

// =============================================================================
// OSINT Discovery (companies, career pages, subdomains, ATS detection, dorks)
// =============================================================================

#[async_trait]
pub trait BaseOsintClient: Send + Sync {
    /// Companies matching `query` from one discovery source.
    async fn discover_companies(
        &self,
        source: DiscoverySource,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<CompanyCandidate>>;

    async fn discover_career_pages(&self, domain: &str) -> Result<Vec<CareerPage>>;

    /// Hostnames (no scheme) under `domain` that look job related.
    async fn enumerate_subdomains(&self, domain: &str) -> Result<Vec<String>>;

    async fn detect_platform(&self, url: &str) -> Result<PlatformDetection>;

    /// Result URLs for a raw search-engine dork query.
    async fn search_dork(&self, query: &str, max_results: usize) -> Result<Vec<String>>;
}

// =============================================================================
// Page Fetching (headless rendering lives behind the crawler service)
// =============================================================================

/// Outbound proxy handed to the crawler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    pub url: String,
    #[serde(default)]
    pub protocol: Option<String>,
}

#[async_trait]
pub trait BasePageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str, proxy: Option<&Proxy>) -> Result<FetchedPage>;
}

#[async_trait]
pub trait BaseProxyProvider: Send + Sync {
    /// Next healthy proxy, or `None` when the pool has none to offer.
    async fn next_proxy(&self) -> Result<Option<Proxy>>;
}

// =============================================================================
// Parsing and Scoring
// =============================================================================

#[async_trait]
pub trait BaseJobParser: Send + Sync {
    async fn extract_job_links(&self, url: &str, html: &str) -> Result<Vec<JobLink>>;

    async fn parse_job(&self, url: &str, html: &str) -> Result<ParseOutcome>;
}

#[async_trait]
pub trait BaseJobScorer: Send + Sync {
    /// Authenticity/quality score in 0-100.
    async fn score(&self, job: &ParsedJob) -> Result<i32>;
}

// =============================================================================
// Storage (dedup by content hash, idempotent upserts)
// =============================================================================

#[async_trait]
pub trait BaseStore: Send + Sync {
    /// Upsert by URL hash keeping max confidence/priority. Returns URLs written.
    async fn persist_urls(&self, urls: &[UrlCandidate]) -> Result<usize>;

    /// Replace-on-conflict by job hash unless the stored version is newer.
    /// Returns jobs written.
    async fn persist_jobs(&self, jobs: &[Job]) -> Result<usize>;

    /// Insert new companies (stamped `discovered_at`), refresh known ones.
    async fn persist_companies(
        &self,
        companies: &[CompanyCandidate],
        discovered_at: DateTime<Utc>,
    ) -> Result<usize>;

    async fn find_company(&self, domain: &str) -> Result<Option<Company>>;

    /// Active companies last discovered before `cutoff`.
    async fn find_stale_companies(&self, cutoff: DateTime<Utc>) -> Result<Vec<Company>>;

    async fn touch_company_discovered(&self, domain: &str, at: DateTime<Utc>) -> Result<()>;
}
