//! Company discovery workflow
//!
//! Durable workflow for one discovery query:
//! 1. Discover companies from every requested source in parallel
//! 2. Register the companies
//! 3. Per company, discover career pages and subdomains
//! 4. Detect ATS platforms for every URL
//! 5. Queue URLs, then crawl each one as a child workflow

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use durable::{TaskOptions, WorkflowContext, WorkflowError, UNBOUNDED};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domains::companies::{CompanyCandidate, DiscoverySource};
use crate::domains::crawling::{CareerPageCrawlRequest, CareerPageCrawlWorkflow};
use crate::domains::discovery::activities;
use crate::domains::discovery::models::{PlatformDetection, UrlCandidate};
use crate::kernel::http::classify_error;
use crate::kernel::ServerDeps;

/// Request to discover companies and their job pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyDiscoveryRequest {
    /// Search query, or a bare domain for `Manual`.
    pub query: String,
    pub sources: Vec<DiscoverySource>,
    pub max_results: usize,
}

impl CompanyDiscoveryRequest {
    pub fn new(query: impl Into<String>, sources: Vec<DiscoverySource>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            sources,
            max_results,
        }
    }

    /// Re-discovery of one known company by domain.
    pub fn seed(domain: &str) -> Self {
        Self::new(domain, vec![DiscoverySource::Manual], 10)
    }
}

/// Result of company discovery workflow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyDiscoveryResult {
    pub companies_found: usize,
    /// URL candidates (career pages and subdomains) found for those companies.
    pub career_pages_found: usize,
    pub urls_queued: usize,
    /// Detected ATS platform -> number of URLs hosted on it.
    pub platforms: BTreeMap<String, usize>,
    pub crawls_total: usize,
    pub crawls_succeeded: usize,
    pub jobs_stored: usize,
    /// Set when the run stopped early; counts cover the steps reached.
    pub cancelled: bool,
    pub duration: Duration,
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("discovery request names no sources")]
    NoSources,

    #[error(transparent)]
    Step(#[from] WorkflowError),
}

impl DiscoveryError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DiscoveryError::Step(e) if e.is_cancelled())
    }
}

pub struct CompanyDiscoveryWorkflow {
    pub deps: ServerDeps,
}

impl CompanyDiscoveryWorkflow {
    pub fn new(deps: ServerDeps) -> Self {
        Self { deps }
    }

    pub async fn run(
        &self,
        ctx: &WorkflowContext,
        request: CompanyDiscoveryRequest,
    ) -> Result<CompanyDiscoveryResult, DiscoveryError> {
        if request.sources.is_empty() {
            return Err(DiscoveryError::NoSources);
        }

        info!(
            query = %request.query,
            sources = ?request.sources,
            max_results = request.max_results,
            "Starting company discovery workflow"
        );

        let started_at = ctx.now().await?;
        let mut result = CompanyDiscoveryResult::default();

        self.discover(ctx, &request, started_at, &mut result).await;

        result.cancelled = ctx.is_cancelled();
        result.duration = elapsed(ctx, started_at).await;

        if result.cancelled {
            warn!(
                query = %request.query,
                companies = result.companies_found,
                crawls_succeeded = result.crawls_succeeded,
                jobs_stored = result.jobs_stored,
                "Company discovery workflow cancelled"
            );
        } else {
            info!(
                query = %request.query,
                companies = result.companies_found,
                career_pages = result.career_pages_found,
                urls_queued = result.urls_queued,
                crawls_total = result.crawls_total,
                crawls_succeeded = result.crawls_succeeded,
                jobs_stored = result.jobs_stored,
                "Company discovery workflow completed"
            );
        }

        Ok(result)
    }

    /// Fills `result` step by step, stopping at the first step boundary after
    /// cancellation.
    async fn discover(
        &self,
        ctx: &WorkflowContext,
        request: &CompanyDiscoveryRequest,
        started_at: DateTime<Utc>,
        result: &mut CompanyDiscoveryResult,
    ) {
        let settings = &self.deps.settings;

        // Step 1: every source in parallel; a failed source contributes nothing
        let companies = self.discover_companies(ctx, request).await;
        result.companies_found = companies.len();
        if ctx.is_cancelled() {
            return;
        }

        if companies.is_empty() {
            info!(query = %request.query, "No companies discovered");
            return;
        }

        // Step 2: register companies for later staleness checks
        self.register_companies(ctx, &companies, started_at).await;

        // Step 3: career pages and subdomains per company
        let this = self;
        let mut candidates: Vec<UrlCandidate> = ctx
            .fan_out(
                "company_urls",
                companies.iter().map(|c| c.domain.clone()).collect(),
                settings.discovery_concurrency,
                move |branch, domain| async move { this.discover_company_urls(&branch, domain).await },
            )
            .await
            .into_iter()
            .flatten()
            .collect();
        result.career_pages_found = candidates.len();
        if ctx.is_cancelled() {
            return;
        }

        // Step 4: ATS platform per URL
        let detections: Vec<PlatformDetection> = ctx
            .fan_out(
                "detect_platforms",
                candidates.iter().map(|c| c.url.clone()).collect(),
                settings.discovery_concurrency,
                move |branch, url| async move { this.detect_platform(&branch, url).await },
            )
            .await;

        for (candidate, detection) in candidates.iter_mut().zip(&detections) {
            if let Some(platform) = detection.platform_name() {
                *result.platforms.entry(platform.to_string()).or_default() += 1;
                candidate.platform = Some(platform.to_string());
            }
        }
        if ctx.is_cancelled() {
            return;
        }

        // Step 5: queue everything, then crawl
        result.urls_queued = self.queue_urls(ctx, &candidates).await;
        if ctx.is_cancelled() {
            return;
        }

        let crawls = crawl_requests(&companies, &candidates);
        result.crawls_total = crawls.len();

        // Cancelled crawls still report what they stored
        let crawler = &CareerPageCrawlWorkflow::new(self.deps.clone());
        let outcomes = ctx
            .fan_out(
                "crawls",
                crawls,
                settings.crawl_concurrency,
                move |branch, crawl| async move {
                    let child = branch.child("career_page_crawl");
                    crawler.run(&child, crawl).await
                },
            )
            .await;

        for outcome in &outcomes {
            if outcome.success {
                result.crawls_succeeded += 1;
            }
            result.jobs_stored += outcome.jobs_stored;
        }
    }

    async fn discover_companies(
        &self,
        ctx: &WorkflowContext,
        request: &CompanyDiscoveryRequest,
    ) -> Vec<CompanyCandidate> {
        let deps = &self.deps;
        let query = request.query.as_str();
        let max_results = request.max_results;

        ctx.fan_out(
            "sources",
            request.sources.clone(),
            UNBOUNDED,
            move |branch, source| async move {
                let discovered = branch
                    .run("discover_companies", TaskOptions::discovery(), move || async move {
                        activities::discover_companies(source, query, max_results, deps)
                            .await
                            .map_err(classify_error)
                    })
                    .await;

                match discovered {
                    Ok(companies) => companies,
                    Err(e) => {
                        warn!(source = %source, query, error = %e, "Discovery source failed");
                        Vec::new()
                    }
                }
            },
        )
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    async fn register_companies(
        &self,
        ctx: &WorkflowContext,
        companies: &[CompanyCandidate],
        discovered_at: DateTime<Utc>,
    ) {
        let deps = &self.deps;
        let stored = ctx
            .run("store_companies", TaskOptions::database(), move || async move {
                activities::store_companies(companies, discovered_at, deps)
                    .await
                    .map_err(classify_error)
            })
            .await;

        if let Err(e) = stored {
            warn!(count = companies.len(), error = %e, "Failed to register companies");
        }
    }

    /// Career pages and subdomains for one domain, discovered concurrently.
    async fn discover_company_urls(&self, ctx: &WorkflowContext, domain: String) -> Vec<UrlCandidate> {
        let deps = &self.deps;
        let domain = domain.as_str();

        let career_pages = ctx.run("career_pages", TaskOptions::discovery(), move || async move {
            activities::discover_career_pages(domain, deps)
                .await
                .map_err(classify_error)
        });
        let subdomains = ctx.run("subdomains", TaskOptions::discovery(), move || async move {
            activities::enumerate_subdomains(domain, deps)
                .await
                .map_err(classify_error)
        });

        let (career_pages, subdomains) = futures::join!(career_pages, subdomains);

        let career_pages = career_pages.unwrap_or_else(|e| {
            warn!(domain, error = %e, "Career page discovery failed");
            Vec::new()
        });
        let subdomains = subdomains.unwrap_or_else(|e| {
            warn!(domain, error = %e, "Subdomain enumeration failed");
            Vec::new()
        });

        career_pages.into_iter().chain(subdomains).collect()
    }

    async fn detect_platform(&self, ctx: &WorkflowContext, url: String) -> PlatformDetection {
        let deps = &self.deps;
        let url = url.as_str();

        ctx.run("detect_platform", TaskOptions::discovery(), move || async move {
            activities::detect_platform(url, deps)
                .await
                .map_err(classify_error)
        })
        .await
        .unwrap_or_else(|e| {
            warn!(url, error = %e, "Platform detection failed");
            PlatformDetection::default()
        })
    }

    async fn queue_urls(&self, ctx: &WorkflowContext, candidates: &[UrlCandidate]) -> usize {
        if candidates.is_empty() {
            return 0;
        }

        let deps = &self.deps;
        ctx.run("store_urls", TaskOptions::database(), move || async move {
            activities::store_urls(candidates, deps)
                .await
                .map_err(classify_error)
        })
        .await
        .unwrap_or_else(|e| {
            warn!(count = candidates.len(), error = %e, "Failed to queue URLs");
            0
        })
    }
}

/// One crawl per URL, grouped by owning domain in first-seen order. The
/// company's discovered name is used when known, else the domain.
fn crawl_requests(
    companies: &[CompanyCandidate],
    candidates: &[UrlCandidate],
) -> Vec<CareerPageCrawlRequest> {
    let mut names: HashMap<&str, &str> = HashMap::new();
    for company in companies {
        names.entry(company.domain.as_str()).or_insert(company.name.as_str());
    }

    let mut domains: Vec<&str> = Vec::new();
    let mut by_domain: HashMap<&str, Vec<&UrlCandidate>> = HashMap::new();
    for candidate in candidates {
        let urls = by_domain.entry(candidate.domain.as_str()).or_default();
        if urls.is_empty() {
            domains.push(candidate.domain.as_str());
        }
        urls.push(candidate);
    }

    domains
        .into_iter()
        .flat_map(|domain| {
            let name = names
                .get(domain)
                .copied()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(domain);
            by_domain
                .remove(domain)
                .unwrap_or_default()
                .into_iter()
                .map(move |candidate| CareerPageCrawlRequest::new(candidate.url.as_str(), name))
        })
        .collect()
}

/// Time since `started_at`. A cancelled run cannot journal its end time, so
/// the wall clock stands in for this informational value.
pub(crate) async fn elapsed(ctx: &WorkflowContext, started_at: DateTime<Utc>) -> Duration {
    let finished_at = ctx.now().await.unwrap_or_else(|_| Utc::now());
    (finished_at - started_at).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crawl_requests_group_by_domain_and_resolve_names() {
        let companies = vec![CompanyCandidate {
            name: "Acme Corp".to_string(),
            domain: "acme.com".to_string(),
            description: None,
            source: DiscoverySource::CodeHost,
        }];
        let candidates = vec![
            UrlCandidate::career_page("https://acme.com/careers", "acme.com", 0.9),
            UrlCandidate::subdomain("jobs.globex.io", "globex.io"),
            UrlCandidate::subdomain("jobs.acme.com", "acme.com"),
        ];

        let requests = crawl_requests(&companies, &candidates);

        assert_eq!(
            requests,
            vec![
                CareerPageCrawlRequest::new("https://acme.com/careers", "Acme Corp"),
                CareerPageCrawlRequest::new("https://jobs.acme.com", "Acme Corp"),
                CareerPageCrawlRequest::new("https://jobs.globex.io", "globex.io"),
            ]
        );
    }

    #[test]
    fn no_sources_is_not_a_cancellation() {
        assert!(!DiscoveryError::NoSources.is_cancelled());
        assert!(DiscoveryError::from(WorkflowError::Cancelled {
            task: "x".to_string()
        })
        .is_cancelled());
    }
}
