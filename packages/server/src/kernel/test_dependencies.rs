// TestDependencies - mock implementations for testing
//
// Provides mock collaborators and an in-memory store that can be injected
// into ServerDeps for workflow tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use durable::InMemoryJournal;

use super::{
    BaseJobParser, BaseJobScorer, BaseOsintClient, BasePageFetcher, BaseProxyProvider, BaseStore,
    Proxy, ServerDeps,
};
use crate::config::WorkflowSettings;
use crate::domains::companies::{Company, CompanyCandidate, DiscoverySource};
use crate::domains::crawling::types::{FetchedPage, JobLink, ParseOutcome};
use crate::domains::discovery::models::{CareerPage, DiscoveredUrl, PlatformDetection, UrlCandidate};
use crate::domains::jobs::{Job, ParsedJob};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Mock Page Fetcher
// =============================================================================

/// Serves canned HTML per URL. Unknown or failing URLs return an error.
#[derive(Default)]
pub struct MockPageFetcher {
    pages: Mutex<HashMap<String, String>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    proxies_used: Mutex<Vec<Option<String>>>,
    delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        lock(&self.pages).insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_failure(self, url: &str) -> Self {
        lock(&self.failing).insert(url.to_string());
        self
    }

    /// Hold every fetch for `delay` so concurrent fetches overlap.
    pub fn with_delay(self, delay: Duration) -> Self {
        *lock(&self.delay) = Some(delay);
        self
    }

    /// Get all URLs that were fetched, in call order
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn was_fetched(&self, url: &str) -> bool {
        lock(&self.calls).iter().any(|u| u == url)
    }

    pub fn proxies_used(&self) -> Vec<Option<String>> {
        lock(&self.proxies_used).clone()
    }

    /// Highest number of fetches observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BasePageFetcher for MockPageFetcher {
    async fn fetch_page(&self, url: &str, proxy: Option<&Proxy>) -> Result<FetchedPage> {
        lock(&self.calls).push(url.to_string());
        lock(&self.proxies_used).push(proxy.map(|p| p.url.clone()));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if lock(&self.failing).contains(url) {
            bail!("mock fetch failure for {}", url);
        }

        let html = lock(&self.pages)
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no mock page for {}", url))?;

        Ok(FetchedPage {
            url: url.to_string(),
            html,
            status: 200,
        })
    }
}

// =============================================================================
// Mock Job Parser
// =============================================================================

/// Link lists per career-page URL and parse outcomes per job-page URL.
/// Job pages without a configured posting are `NotParseable`.
#[derive(Default)]
pub struct MockJobParser {
    links: Mutex<HashMap<String, Vec<JobLink>>>,
    jobs: Mutex<HashMap<String, ParsedJob>>,
    failing_links: Mutex<HashSet<String>>,
    failing_parses: Mutex<HashSet<String>>,
    parse_calls: Mutex<Vec<String>>,
}

impl MockJobParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_links(self, page_url: &str, links: &[&str]) -> Self {
        lock(&self.links).insert(
            page_url.to_string(),
            links.iter().map(|link| JobLink::new(*link)).collect(),
        );
        self
    }

    pub fn with_job(self, job_url: &str, job: ParsedJob) -> Self {
        lock(&self.jobs).insert(job_url.to_string(), job);
        self
    }

    pub fn with_link_failure(self, page_url: &str) -> Self {
        lock(&self.failing_links).insert(page_url.to_string());
        self
    }

    pub fn with_parse_failure(self, job_url: &str) -> Self {
        lock(&self.failing_parses).insert(job_url.to_string());
        self
    }

    pub fn parse_calls(&self) -> Vec<String> {
        lock(&self.parse_calls).clone()
    }
}

#[async_trait]
impl BaseJobParser for MockJobParser {
    async fn extract_job_links(&self, url: &str, _html: &str) -> Result<Vec<JobLink>> {
        if lock(&self.failing_links).contains(url) {
            bail!("mock link extraction failure for {}", url);
        }
        Ok(lock(&self.links).get(url).cloned().unwrap_or_default())
    }

    async fn parse_job(&self, url: &str, _html: &str) -> Result<ParseOutcome> {
        lock(&self.parse_calls).push(url.to_string());

        if lock(&self.failing_parses).contains(url) {
            bail!("mock parse failure for {}", url);
        }

        Ok(match lock(&self.jobs).get(url) {
            Some(job) => ParseOutcome::Parsed(job.clone()),
            None => ParseOutcome::NotParseable,
        })
    }
}

// =============================================================================
// Mock Job Scorer
// =============================================================================

pub struct MockJobScorer {
    default_score: i32,
    scores: Mutex<HashMap<String, i32>>,
    failing: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl MockJobScorer {
    pub fn new(default_score: i32) -> Self {
        Self {
            default_score,
            scores: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Score for jobs with this exact title.
    pub fn with_score(self, title: &str, score: i32) -> Self {
        lock(&self.scores).insert(title.to_string(), score);
        self
    }

    pub fn failing(self) -> Self {
        self.failing.store(true, Ordering::SeqCst);
        self
    }

    /// Titles scored, in call order
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

impl Default for MockJobScorer {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl BaseJobScorer for MockJobScorer {
    async fn score(&self, job: &ParsedJob) -> Result<i32> {
        lock(&self.calls).push(job.title.clone());

        if self.failing.load(Ordering::SeqCst) {
            bail!("mock scoring failure");
        }

        Ok(lock(&self.scores)
            .get(&job.title)
            .copied()
            .unwrap_or(self.default_score))
    }
}

// =============================================================================
// Mock OSINT Client
// =============================================================================

#[derive(Default)]
pub struct MockOsintClient {
    companies: Mutex<HashMap<DiscoverySource, Vec<CompanyCandidate>>>,
    failing_sources: Mutex<HashSet<DiscoverySource>>,
    career_pages: Mutex<HashMap<String, Vec<CareerPage>>>,
    subdomains: Mutex<HashMap<String, Vec<String>>>,
    failing_domains: Mutex<HashSet<String>>,
    platforms: Mutex<HashMap<String, PlatformDetection>>,
    dork_results: Mutex<HashMap<String, Vec<String>>>,
    failing_dorks: Mutex<HashSet<String>>,
    source_calls: Mutex<Vec<(DiscoverySource, String)>>,
    detect_calls: Mutex<Vec<String>>,
}

impl MockOsintClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Companies returned by a source, as `(name, domain)` pairs.
    pub fn with_companies(self, source: DiscoverySource, companies: &[(&str, &str)]) -> Self {
        let companies = companies
            .iter()
            .map(|(name, domain)| CompanyCandidate {
                name: name.to_string(),
                domain: domain.to_string(),
                description: None,
                source,
            })
            .collect();
        lock(&self.companies).insert(source, companies);
        self
    }

    pub fn with_failing_source(self, source: DiscoverySource) -> Self {
        lock(&self.failing_sources).insert(source);
        self
    }

    pub fn with_career_page(self, domain: &str, url: &str, confidence: f64) -> Self {
        lock(&self.career_pages)
            .entry(domain.to_string())
            .or_default()
            .push(CareerPage {
                url: url.to_string(),
                confidence,
            });
        self
    }

    pub fn with_subdomains(self, domain: &str, subdomains: &[&str]) -> Self {
        lock(&self.subdomains).insert(
            domain.to_string(),
            subdomains.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// Career-page and subdomain discovery both fail for this domain.
    pub fn with_failing_domain(self, domain: &str) -> Self {
        lock(&self.failing_domains).insert(domain.to_string());
        self
    }

    pub fn with_platform(self, url: &str, platform: &str) -> Self {
        lock(&self.platforms).insert(url.to_string(), PlatformDetection::detected(platform, 0.9));
        self
    }

    pub fn with_dork_results(self, query: &str, urls: &[&str]) -> Self {
        lock(&self.dork_results).insert(
            query.to_string(),
            urls.iter().map(|u| u.to_string()).collect(),
        );
        self
    }

    pub fn with_failing_dork(self, query: &str) -> Self {
        lock(&self.failing_dorks).insert(query.to_string());
        self
    }

    pub fn source_calls(&self) -> Vec<(DiscoverySource, String)> {
        lock(&self.source_calls).clone()
    }

    pub fn detect_calls(&self) -> Vec<String> {
        lock(&self.detect_calls).clone()
    }

    fn check_domain(&self, domain: &str) -> Result<()> {
        if lock(&self.failing_domains).contains(domain) {
            bail!("mock OSINT failure for {}", domain);
        }
        Ok(())
    }
}

#[async_trait]
impl BaseOsintClient for MockOsintClient {
    async fn discover_companies(
        &self,
        source: DiscoverySource,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<CompanyCandidate>> {
        lock(&self.source_calls).push((source, query.to_string()));

        if lock(&self.failing_sources).contains(&source) {
            bail!("mock {} source failure", source.as_str());
        }

        if source == DiscoverySource::Manual && !lock(&self.companies).contains_key(&source) {
            return Ok(vec![CompanyCandidate::seed(query)]);
        }

        let mut companies = lock(&self.companies).get(&source).cloned().unwrap_or_default();
        companies.truncate(max_results);
        Ok(companies)
    }

    async fn discover_career_pages(&self, domain: &str) -> Result<Vec<CareerPage>> {
        self.check_domain(domain)?;
        Ok(lock(&self.career_pages).get(domain).cloned().unwrap_or_default())
    }

    async fn enumerate_subdomains(&self, domain: &str) -> Result<Vec<String>> {
        self.check_domain(domain)?;
        Ok(lock(&self.subdomains).get(domain).cloned().unwrap_or_default())
    }

    async fn detect_platform(&self, url: &str) -> Result<PlatformDetection> {
        lock(&self.detect_calls).push(url.to_string());
        Ok(lock(&self.platforms).get(url).cloned().unwrap_or_default())
    }

    async fn search_dork(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        if lock(&self.failing_dorks).contains(query) {
            bail!("mock dork failure for {}", query);
        }
        let mut urls = lock(&self.dork_results).get(query).cloned().unwrap_or_default();
        urls.truncate(max_results);
        Ok(urls)
    }
}

// =============================================================================
// Mock Proxy Provider
// =============================================================================

/// Hands out a fixed proxy, or fails every lookup.
pub struct MockProxyProvider {
    proxy: Option<Proxy>,
    failing: bool,
}

impl MockProxyProvider {
    pub fn with_proxy(url: &str) -> Self {
        Self {
            proxy: Some(Proxy {
                url: url.to_string(),
                protocol: Some("http".to_string()),
            }),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            proxy: None,
            failing: true,
        }
    }
}

#[async_trait]
impl BaseProxyProvider for MockProxyProvider {
    async fn next_proxy(&self) -> Result<Option<Proxy>> {
        if self.failing {
            bail!("mock proxy manager unavailable");
        }
        Ok(self.proxy.clone())
    }
}

// =============================================================================
// In-memory Store
// =============================================================================

#[derive(Default)]
struct MemoryState {
    companies: BTreeMap<String, Company>,
    urls: BTreeMap<String, DiscoveredUrl>,
    jobs: BTreeMap<String, Job>,
}

/// `BaseStore` with the same upsert rules as the Postgres adapter.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    fail_jobs: AtomicBool,
    fail_urls: AtomicBool,
    fail_companies: AtomicBool,
    fail_stale: AtomicBool,
    fail_touch: AtomicBool,
    job_batches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an active company last discovered at `last_discovered_at`.
    pub fn with_company(self, domain: &str, name: &str, last_discovered_at: DateTime<Utc>) -> Self {
        lock(&self.state).companies.insert(
            domain.to_string(),
            Company {
                domain: domain.to_string(),
                name: name.to_string(),
                description: None,
                source: DiscoverySource::Manual,
                last_discovered_at,
                is_active: true,
            },
        );
        self
    }

    pub fn with_inactive_company(self, domain: &str, last_discovered_at: DateTime<Utc>) -> Self {
        let store = self.with_company(domain, domain, last_discovered_at);
        if let Some(company) = lock(&store.state).companies.get_mut(domain) {
            company.is_active = false;
        }
        store
    }

    pub fn failing_job_writes(self) -> Self {
        self.fail_jobs.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_url_writes(self) -> Self {
        self.fail_urls.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_company_writes(self) -> Self {
        self.fail_companies.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_stale_lookup(self) -> Self {
        self.fail_stale.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_touch(self) -> Self {
        self.fail_touch.store(true, Ordering::SeqCst);
        self
    }

    pub fn jobs(&self) -> Vec<Job> {
        lock(&self.state).jobs.values().cloned().collect()
    }

    pub fn job(&self, job_hash: &str) -> Option<Job> {
        lock(&self.state).jobs.get(job_hash).cloned()
    }

    /// Number of `persist_jobs` calls that reached the store.
    pub fn job_batches(&self) -> usize {
        self.job_batches.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<DiscoveredUrl> {
        lock(&self.state).urls.values().cloned().collect()
    }

    pub fn url(&self, url: &str) -> Option<DiscoveredUrl> {
        lock(&self.state).urls.get(&crate::common::url_hash(url)).cloned()
    }

    pub fn companies(&self) -> Vec<Company> {
        lock(&self.state).companies.values().cloned().collect()
    }

    pub fn company(&self, domain: &str) -> Option<Company> {
        lock(&self.state).companies.get(domain).cloned()
    }
}

#[async_trait]
impl BaseStore for MemoryStore {
    async fn persist_urls(&self, urls: &[UrlCandidate]) -> Result<usize> {
        if self.fail_urls.load(Ordering::SeqCst) {
            bail!("mock URL store failure");
        }

        let mut state = lock(&self.state);
        for candidate in urls {
            let company_exists = state.companies.contains_key(&candidate.domain);
            state
                .urls
                .entry(candidate.url_hash())
                .and_modify(|existing| existing.merge(candidate, company_exists))
                .or_insert_with(|| DiscoveredUrl::from_candidate(candidate, company_exists));
        }
        Ok(urls.len())
    }

    async fn persist_jobs(&self, jobs: &[Job]) -> Result<usize> {
        if self.fail_jobs.load(Ordering::SeqCst) {
            bail!("mock job store failure");
        }
        self.job_batches.fetch_add(1, Ordering::SeqCst);

        let mut state = lock(&self.state);
        let mut stored = 0;
        for job in jobs {
            let newer_stored = state
                .jobs
                .get(&job.job_hash)
                .is_some_and(|existing| existing.version > job.version);
            if !newer_stored {
                state.jobs.insert(job.job_hash.clone(), job.clone());
                stored += 1;
            }
        }
        Ok(stored)
    }

    async fn persist_companies(
        &self,
        companies: &[CompanyCandidate],
        discovered_at: DateTime<Utc>,
    ) -> Result<usize> {
        if self.fail_companies.load(Ordering::SeqCst) {
            bail!("mock company store failure");
        }

        let mut state = lock(&self.state);
        for candidate in companies {
            state
                .companies
                .entry(candidate.domain.clone())
                .and_modify(|existing| {
                    existing.name = candidate.name.clone();
                    if candidate.description.is_some() {
                        existing.description = candidate.description.clone();
                    }
                })
                .or_insert_with(|| Company {
                    domain: candidate.domain.clone(),
                    name: candidate.name.clone(),
                    description: candidate.description.clone(),
                    source: candidate.source,
                    last_discovered_at: discovered_at,
                    is_active: true,
                });
        }
        Ok(companies.len())
    }

    async fn find_company(&self, domain: &str) -> Result<Option<Company>> {
        Ok(self.company(domain))
    }

    async fn find_stale_companies(&self, cutoff: DateTime<Utc>) -> Result<Vec<Company>> {
        if self.fail_stale.load(Ordering::SeqCst) {
            bail!("mock stale lookup failure");
        }

        let mut stale: Vec<Company> = lock(&self.state)
            .companies
            .values()
            .filter(|c| c.is_active && c.last_discovered_at < cutoff)
            .cloned()
            .collect();
        stale.sort_by(|a, b| {
            a.last_discovered_at
                .cmp(&b.last_discovered_at)
                .then_with(|| a.domain.cmp(&b.domain))
        });
        Ok(stale)
    }

    async fn touch_company_discovered(&self, domain: &str, at: DateTime<Utc>) -> Result<()> {
        if self.fail_touch.load(Ordering::SeqCst) {
            bail!("mock touch failure for {}", domain);
        }
        if let Some(company) = lock(&self.state).companies.get_mut(domain) {
            company.last_discovered_at = at;
        }
        Ok(())
    }
}

// =============================================================================
// TestDependencies builder
// =============================================================================

/// Builder for `ServerDeps` backed entirely by mocks.
///
/// Keep handles to the mocks you want to inspect and pass clones of the
/// `Arc`s in:
///
/// ```ignore
/// let store = Arc::new(MemoryStore::new());
/// let deps = TestDependencies::new()
///     .store(store.clone())
///     .into_server_deps(WorkflowSettings::default());
/// ```
pub struct TestDependencies {
    pub store: Arc<MemoryStore>,
    pub osint: Arc<MockOsintClient>,
    pub page_fetcher: Arc<MockPageFetcher>,
    pub job_parser: Arc<MockJobParser>,
    pub job_scorer: Arc<MockJobScorer>,
    pub proxies: Arc<dyn BaseProxyProvider>,
    pub journal: Arc<InMemoryJournal>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            osint: Arc::new(MockOsintClient::new()),
            page_fetcher: Arc::new(MockPageFetcher::new()),
            job_parser: Arc::new(MockJobParser::new()),
            job_scorer: Arc::new(MockJobScorer::default()),
            proxies: Arc::new(super::NoopProxyProvider),
            journal: Arc::new(InMemoryJournal::new()),
        }
    }

    pub fn store(mut self, store: Arc<MemoryStore>) -> Self {
        self.store = store;
        self
    }

    pub fn osint(mut self, osint: Arc<MockOsintClient>) -> Self {
        self.osint = osint;
        self
    }

    pub fn page_fetcher(mut self, page_fetcher: Arc<MockPageFetcher>) -> Self {
        self.page_fetcher = page_fetcher;
        self
    }

    pub fn job_parser(mut self, job_parser: Arc<MockJobParser>) -> Self {
        self.job_parser = job_parser;
        self
    }

    pub fn job_scorer(mut self, job_scorer: Arc<MockJobScorer>) -> Self {
        self.job_scorer = job_scorer;
        self
    }

    pub fn proxies(mut self, proxies: Arc<dyn BaseProxyProvider>) -> Self {
        self.proxies = proxies;
        self
    }

    pub fn journal(mut self, journal: Arc<InMemoryJournal>) -> Self {
        self.journal = journal;
        self
    }

    /// Convert TestDependencies into ServerDeps
    pub fn into_server_deps(self, settings: WorkflowSettings) -> ServerDeps {
        ServerDeps::new(
            self.store,
            self.osint,
            self.page_fetcher,
            self.job_parser,
            self.job_scorer,
            self.proxies,
            self.journal,
            settings,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
