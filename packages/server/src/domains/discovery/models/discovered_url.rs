use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::url_hash;

/// What kind of page a discovered URL is believed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    CareerPage,
    Subdomain,
    AtsDetected,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::CareerPage => "career_page",
            PageType::Subdomain => "subdomain",
            PageType::AtsDetected => "ats_detected",
        }
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PageType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "career_page" => Ok(PageType::CareerPage),
            "subdomain" => Ok(PageType::Subdomain),
            "ats_detected" => Ok(PageType::AtsDetected),
            _ => Err(anyhow::anyhow!("Invalid page type: {}", s)),
        }
    }
}

/// Crawl lifecycle of a queued URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    Pending,
    Crawling,
    Completed,
    Failed,
}

impl CrawlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlStatus::Pending => "pending",
            CrawlStatus::Crawling => "crawling",
            CrawlStatus::Completed => "completed",
            CrawlStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline that produced a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryChannel {
    /// Per-company career page / subdomain discovery.
    Osint,
    /// Keyword dork sweep.
    DorkSweep,
}

impl DiscoveryChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryChannel::Osint => "osint",
            DiscoveryChannel::DorkSweep => "dork_sweep",
        }
    }
}

/// A URL found during discovery, tagged with its owning company domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlCandidate {
    pub url: String,
    pub domain: String,
    pub page_type: PageType,
    pub confidence: f64,
    pub platform: Option<String>,
    pub priority: i32,
    pub discovered_via: DiscoveryChannel,
}

impl UrlCandidate {
    pub fn career_page(url: impl Into<String>, domain: &str, confidence: f64) -> Self {
        Self {
            url: url.into(),
            domain: domain.to_string(),
            page_type: PageType::CareerPage,
            confidence: confidence.clamp(0.0, 1.0),
            platform: None,
            priority: 1,
            discovered_via: DiscoveryChannel::Osint,
        }
    }

    /// `jobs.acme.com` -> `https://jobs.acme.com`, half confidence.
    pub fn subdomain(subdomain: &str, domain: &str) -> Self {
        Self {
            url: format!("https://{}", subdomain),
            domain: domain.to_string(),
            page_type: PageType::Subdomain,
            confidence: 0.5,
            platform: None,
            priority: 2,
            discovered_via: DiscoveryChannel::Osint,
        }
    }

    pub fn ats_board(url: impl Into<String>, domain: String, platform: Option<String>, confidence: f64) -> Self {
        Self {
            url: url.into(),
            domain,
            page_type: PageType::AtsDetected,
            confidence: confidence.clamp(0.0, 1.0),
            platform,
            priority: 1,
            discovered_via: DiscoveryChannel::DorkSweep,
        }
    }

    pub fn url_hash(&self) -> String {
        url_hash(&self.url)
    }
}

/// Stored row for a discovered URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredUrl {
    pub url_hash: String,
    pub url: String,
    /// Set only when the owning company exists in the store.
    pub company_domain: Option<String>,
    pub page_type: PageType,
    pub confidence: f64,
    pub platform: Option<String>,
    pub priority: i32,
    pub status: CrawlStatus,
    pub discovered_via: DiscoveryChannel,
}

impl DiscoveredUrl {
    /// First-sighting row for a candidate.
    pub fn from_candidate(candidate: &UrlCandidate, company_exists: bool) -> Self {
        Self {
            url_hash: candidate.url_hash(),
            url: candidate.url.clone(),
            company_domain: company_exists.then(|| candidate.domain.clone()),
            page_type: candidate.page_type,
            confidence: candidate.confidence,
            platform: candidate.platform.clone(),
            priority: candidate.priority,
            status: CrawlStatus::Pending,
            discovered_via: candidate.discovered_via,
        }
    }

    /// Fold a re-sighting into an existing row: confidence and priority only
    /// ever go up, a known platform is never cleared.
    pub fn merge(&mut self, candidate: &UrlCandidate, company_exists: bool) {
        self.confidence = self.confidence.max(candidate.confidence);
        self.priority = self.priority.max(candidate.priority);
        if self.platform.is_none() {
            self.platform = candidate.platform.clone();
        }
        if self.company_domain.is_none() && company_exists {
            self.company_domain = Some(candidate.domain.clone());
        }
    }

    /// Idempotent upsert keyed by URL hash. Returns the number of candidates
    /// written (inserted or merged).
    pub async fn upsert_many(candidates: &[UrlCandidate], pool: &PgPool) -> Result<usize> {
        let mut tx = pool.begin().await.context("Failed to begin transaction")?;
        let mut queued = 0;

        for candidate in candidates {
            let result = sqlx::query(
                r#"
                INSERT INTO discovered_urls (
                    url_hash, url, company_domain, page_type, confidence,
                    platform, priority, status, discovered_via
                ) VALUES (
                    $1, $2, (SELECT domain FROM companies WHERE domain = $3), $4, $5,
                    $6, $7, 'pending', $8
                )
                ON CONFLICT (url_hash) DO UPDATE
                SET confidence = GREATEST(discovered_urls.confidence, EXCLUDED.confidence),
                    priority = GREATEST(discovered_urls.priority, EXCLUDED.priority),
                    platform = COALESCE(discovered_urls.platform, EXCLUDED.platform),
                    company_domain = COALESCE(discovered_urls.company_domain, EXCLUDED.company_domain)
                "#,
            )
            .bind(candidate.url_hash())
            .bind(&candidate.url)
            .bind(&candidate.domain)
            .bind(candidate.page_type.as_str())
            .bind(candidate.confidence)
            .bind(&candidate.platform)
            .bind(candidate.priority)
            .bind(candidate.discovered_via.as_str())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to queue URL {}", candidate.url))?;

            queued += result.rows_affected() as usize;
        }

        tx.commit().await.context("Failed to commit discovered URLs")?;
        Ok(queued)
    }

    pub async fn find_by_url(url: &str, pool: &PgPool) -> Result<Option<(String, f64, i32, Option<String>)>> {
        sqlx::query_as::<_, (String, f64, i32, Option<String>)>(
            r#"
            SELECT url, confidence, priority, platform
            FROM discovered_urls
            WHERE url_hash = $1
            "#,
        )
        .bind(url_hash(url))
        .fetch_optional(pool)
        .await
        .context("Failed to load discovered URL")
    }
}
