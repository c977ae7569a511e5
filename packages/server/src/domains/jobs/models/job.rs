use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::job_hash;

/// Platform tag for jobs found by crawling a company's own career page.
pub const CAREER_PAGE_PLATFORM: &str = "career_page";

/// Job type used when the parser does not report one.
pub const DEFAULT_JOB_TYPE: &str = "full-time";

/// Structured posting as returned by the parser. Every field except the title
/// is optional; normalization fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedJob {
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub salary_min: Option<i64>,
    #[serde(default)]
    pub salary_max: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    /// 0-100 when the parser scored the posting itself.
    #[serde(default)]
    pub quality_score: Option<i32>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub source_platform: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ParsedJob {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_score(mut self, score: i32) -> Self {
        self.quality_score = Some(score);
        self
    }

    /// Fill `source_url`, `source_platform` and `company` when the parser
    /// left them empty.
    pub fn normalize(mut self, link_url: &str, company_name: &str) -> Self {
        if is_blank(&self.source_url) {
            self.source_url = Some(link_url.to_string());
        }
        if is_blank(&self.source_platform) {
            self.source_platform = Some(CAREER_PAGE_PLATFORM.to_string());
        }
        if is_blank(&self.company) {
            self.company = Some(company_name.to_string());
        }
        self
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Stored job posting. Identity is `job_hash`; `version` orders writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub job_hash: String,
    pub title: String,
    pub company: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub remote: bool,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub currency: Option<String>,
    pub job_type: String,
    pub experience_level: Option<String>,
    pub quality_score: i32,
    pub source_url: String,
    pub source_platform: String,
    pub tags: Vec<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl Job {
    /// Build the stored record from a normalized parse. `score` wins over any
    /// parser-supplied score and is clamped to 0-100.
    pub fn from_parsed(parsed: ParsedJob, score: i32, version: i64) -> Self {
        let source_url = parsed.source_url.unwrap_or_default();
        let company = parsed.company.unwrap_or_default();

        Self {
            job_hash: job_hash(&source_url, &parsed.title, &company),
            title: parsed.title,
            company,
            description: parsed.description,
            location: parsed.location,
            remote: parsed.remote,
            salary_min: parsed.salary_min,
            salary_max: parsed.salary_max,
            currency: parsed.currency,
            job_type: parsed
                .job_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_JOB_TYPE.to_string()),
            experience_level: parsed.experience_level,
            quality_score: score.clamp(0, 100),
            source_url,
            source_platform: parsed
                .source_platform
                .unwrap_or_else(|| CAREER_PAGE_PLATFORM.to_string()),
            tags: parsed.tags,
            posted_at: parsed.posted_at,
            updated_at: parsed.updated_at,
            version,
        }
    }

    // =========================================================================
    // SQL Queries
    // =========================================================================

    /// Replace-on-conflict by job hash, guarded by version: a write whose
    /// version is lower than the stored one is skipped. Returns rows written.
    pub async fn upsert_many(jobs: &[Job], pool: &PgPool) -> Result<usize> {
        let mut tx = pool.begin().await.context("Failed to begin transaction")?;
        let mut stored = 0;

        for job in jobs {
            let result = sqlx::query(
                r#"
                INSERT INTO jobs (
                    job_hash, title, company, description, location, remote,
                    salary_min, salary_max, currency, job_type, experience_level,
                    quality_score, source_url, source_platform, tags,
                    posted_at, updated_at, version
                ) VALUES (
                    $1, $2, $3, $4, $5, $6,
                    $7, $8, $9, $10, $11,
                    $12, $13, $14, $15,
                    $16, $17, $18
                )
                ON CONFLICT (job_hash) DO UPDATE
                SET title = EXCLUDED.title,
                    company = EXCLUDED.company,
                    description = EXCLUDED.description,
                    location = EXCLUDED.location,
                    remote = EXCLUDED.remote,
                    salary_min = EXCLUDED.salary_min,
                    salary_max = EXCLUDED.salary_max,
                    currency = EXCLUDED.currency,
                    job_type = EXCLUDED.job_type,
                    experience_level = EXCLUDED.experience_level,
                    quality_score = EXCLUDED.quality_score,
                    source_url = EXCLUDED.source_url,
                    source_platform = EXCLUDED.source_platform,
                    tags = EXCLUDED.tags,
                    posted_at = EXCLUDED.posted_at,
                    updated_at = EXCLUDED.updated_at,
                    version = EXCLUDED.version
                WHERE jobs.version <= EXCLUDED.version
                "#,
            )
            .bind(&job.job_hash)
            .bind(&job.title)
            .bind(&job.company)
            .bind(&job.description)
            .bind(&job.location)
            .bind(job.remote)
            .bind(job.salary_min)
            .bind(job.salary_max)
            .bind(&job.currency)
            .bind(&job.job_type)
            .bind(&job.experience_level)
            .bind(job.quality_score)
            .bind(&job.source_url)
            .bind(&job.source_platform)
            .bind(&job.tags)
            .bind(job.posted_at)
            .bind(job.updated_at)
            .bind(job.version)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to upsert job {}", job.job_hash))?;

            stored += result.rows_affected() as usize;
        }

        tx.commit().await.context("Failed to commit jobs")?;
        Ok(stored)
    }

    pub async fn find_by_hash(job_hash: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Job>(
            r#"
            SELECT job_hash, title, company, description, location, remote,
                   salary_min, salary_max, currency, job_type, experience_level,
                   quality_score, source_url, source_platform, tags,
                   posted_at, updated_at, version
            FROM jobs
            WHERE job_hash = $1
            "#,
        )
        .bind(job_hash)
        .fetch_optional(pool)
        .await
        .context("Failed to load job")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_fills_missing_fields() {
        let parsed = ParsedJob::new("Backend Engineer").normalize("https://acme.com/jobs/1", "Acme");

        assert_eq!(parsed.source_url.as_deref(), Some("https://acme.com/jobs/1"));
        assert_eq!(parsed.source_platform.as_deref(), Some(CAREER_PAGE_PLATFORM));
        assert_eq!(parsed.company.as_deref(), Some("Acme"));
    }

    #[test]
    fn normalize_keeps_parser_values() {
        let mut parsed = ParsedJob::new("Backend Engineer");
        parsed.source_url = Some("https://boards.greenhouse.io/acme/1".into());
        parsed.source_platform = Some("greenhouse".into());
        parsed.company = Some("Acme Corp".into());

        let parsed = parsed.normalize("https://acme.com/jobs/1", "acme.com");

        assert_eq!(parsed.source_url.as_deref(), Some("https://boards.greenhouse.io/acme/1"));
        assert_eq!(parsed.source_platform.as_deref(), Some("greenhouse"));
        assert_eq!(parsed.company.as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let mut parsed = ParsedJob::new("Designer");
        parsed.source_platform = Some("  ".into());

        let parsed = parsed.normalize("https://acme.com/jobs/2", "Acme");
        assert_eq!(parsed.source_platform.as_deref(), Some(CAREER_PAGE_PLATFORM));
    }

    #[test]
    fn from_parsed_hashes_and_defaults() {
        let parsed = ParsedJob::new("Backend Engineer").normalize("https://acme.com/jobs/1", "Acme");
        let job = Job::from_parsed(parsed, 140, 7);

        assert_eq!(job.job_hash, job_hash("https://acme.com/jobs/1", "Backend Engineer", "Acme"));
        assert_eq!(job.job_type, DEFAULT_JOB_TYPE);
        assert_eq!(job.quality_score, 100);
        assert_eq!(job.version, 7);
    }

    #[test]
    fn parsed_job_accepts_sparse_json() {
        let parsed: ParsedJob = serde_json::from_value(serde_json::json!({
            "title": "SRE",
            "remote": true,
            "tags": ["rust", "k8s"]
        }))
        .unwrap();

        assert!(parsed.remote);
        assert_eq!(parsed.tags, vec!["rust", "k8s"]);
        assert_eq!(parsed.quality_score, None);
    }
}
