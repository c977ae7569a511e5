use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use typed_builder::TypedBuilder;

use crate::domains::crawling::quality::DEFAULT_MIN_QUALITY_SCORE;
use crate::domains::discovery::workflows::ContinuousDiscoveryRequest;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub crawler_service_url: String,
    pub parser_service_url: String,
    pub osint_service_url: String,
    pub realscore_service_url: String,
    pub proxy_manager_url: Option<String>,
    pub http_timeout: Duration,
    pub workflow: WorkflowSettings,
    /// Cron expression (with seconds) for the continuous discovery trigger.
    pub discovery_cron: String,
    pub discovery: ContinuousDiscoveryRequest,
    /// Journal entries older than this many days are pruned after each
    /// scheduled run.
    pub journal_retention_days: i64,
}

/// Tunables threaded through every orchestration via `ServerDeps`.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct WorkflowSettings {
    /// Minimum quality score (0-100) for a job to be stored.
    #[builder(default = DEFAULT_MIN_QUALITY_SCORE)]
    pub min_quality_score: i32,
    /// Job links followed per career page.
    #[builder(default = 5)]
    pub max_job_links: usize,
    /// Job pages fetched/parsed concurrently within one crawl.
    #[builder(default = 10)]
    pub job_fetch_concurrency: usize,
    /// Career-page crawls running concurrently within one discovery.
    #[builder(default = 10)]
    pub crawl_concurrency: usize,
    /// Bound for per-company, per-URL and per-discovery fan-outs.
    #[builder(default = 10)]
    pub discovery_concurrency: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = ContinuousDiscoveryRequest::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            crawler_service_url: env::var("CRAWLER_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8002".to_string()),
            parser_service_url: env::var("PARSER_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            osint_service_url: env::var("OSINT_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8004".to_string()),
            realscore_service_url: env::var("REALSCORE_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8003".to_string()),
            proxy_manager_url: env::var("PROXY_MANAGER_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            http_timeout: Duration::from_secs(parse_env("HTTP_TIMEOUT_SECS", 60)?),
            workflow: WorkflowSettings {
                min_quality_score: parse_env("MIN_REALSCORE_THRESHOLD", DEFAULT_MIN_QUALITY_SCORE)?,
                max_job_links: parse_env("MAX_JOB_LINKS", 5)?,
                job_fetch_concurrency: parse_env("JOB_FETCH_CONCURRENCY", 10)?,
                crawl_concurrency: parse_env("CRAWL_CONCURRENCY", 10)?,
                discovery_concurrency: parse_env("DISCOVERY_CONCURRENCY", 10)?,
            },
            discovery_cron: env::var("DISCOVERY_CRON")
                .unwrap_or_else(|_| "0 0 */6 * * *".to_string()),
            discovery: ContinuousDiscoveryRequest {
                stale_threshold_days: parse_env(
                    "STALE_THRESHOLD_DAYS",
                    defaults.stale_threshold_days,
                )?,
                run_code_host_discovery: parse_env(
                    "RUN_CODE_HOST_DISCOVERY",
                    defaults.run_code_host_discovery,
                )?,
                code_host_query: env::var("CODE_HOST_QUERY").unwrap_or(defaults.code_host_query),
                run_dork_discovery: parse_env("RUN_DORK_DISCOVERY", defaults.run_dork_discovery)?,
                dork_query: env::var("DORK_QUERY").unwrap_or(defaults.dork_query),
                max_new_companies: parse_env("MAX_NEW_COMPANIES", defaults.max_new_companies)?,
            },
            journal_retention_days: parse_env("JOURNAL_RETENTION_DAYS", 30)?,
        })
    }
}

/// Parse an optional environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid value, got {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_settings_defaults() {
        let settings = WorkflowSettings::default();

        assert_eq!(settings.min_quality_score, 70);
        assert_eq!(settings.max_job_links, 5);
        assert_eq!(settings.job_fetch_concurrency, 10);
    }

    #[test]
    fn builder_overrides_single_field() {
        let settings = WorkflowSettings::builder().max_job_links(12).build();

        assert_eq!(settings.max_job_links, 12);
        assert_eq!(settings.crawl_concurrency, 10);
    }

    #[test]
    fn parse_env_falls_back_when_unset() {
        let value: u32 = parse_env("JOBS_CRAWLER_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn parse_env_rejects_garbage() {
        env::set_var("JOBS_CRAWLER_TEST_BAD_NUMBER", "many");
        let result: Result<usize> = parse_env("JOBS_CRAWLER_TEST_BAD_NUMBER", 5);
        assert!(result.is_err());
        env::remove_var("JOBS_CRAWLER_TEST_BAD_NUMBER");
    }
}
