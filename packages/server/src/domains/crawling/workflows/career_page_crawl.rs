//! Career-page crawl workflow
//!
//! Durable workflow that turns one career page into stored jobs:
//! 1. Fetch the career page
//! 2. Extract job links (capped)
//! 3. Fetch and parse each job page in parallel (bounded)
//! 4. Normalize, score unscored postings, apply the quality gate
//! 5. Persist admitted jobs in one batch
//!
//! A crawl never returns an error. Failures end in `CrawlState::Failed` with
//! whatever counts were reached.

use chrono::{DateTime, Utc};
use durable::{TaskOptions, WorkflowContext, WorkflowError};
use tracing::{debug, info, warn};

use crate::domains::crawling::activities;
use crate::domains::crawling::quality::QualityGate;
use crate::domains::crawling::types::{
    CareerPageCrawlRequest, CareerPageCrawlResult, CrawlState, JobLink, ParseOutcome,
};
use crate::domains::jobs::{Job, ParsedJob};
use crate::kernel::http::classify_error;
use crate::kernel::ServerDeps;

pub struct CareerPageCrawlWorkflow {
    pub deps: ServerDeps,
}

impl CareerPageCrawlWorkflow {
    pub fn new(deps: ServerDeps) -> Self {
        Self { deps }
    }

    pub async fn run(
        &self,
        ctx: &WorkflowContext,
        request: CareerPageCrawlRequest,
    ) -> CareerPageCrawlResult {
        info!(url = %request.url, company = %request.company_name, "Starting career page crawl");

        let mut result = CareerPageCrawlResult::new(&request.url);

        let started_at = match ctx.now().await {
            Ok(at) => at,
            Err(e) => {
                result.finish(Err(failure_reason(&e, "clock unavailable")));
                return result;
            }
        };

        let outcome = self.crawl(ctx, &request, started_at, &mut result).await;
        result.finish(outcome);

        // A cancelled run cannot journal its end time; the wall clock is only
        // used for the informational duration.
        let finished_at = ctx.now().await.unwrap_or_else(|_| Utc::now());
        result.duration = (finished_at - started_at).to_std().unwrap_or_default();

        if result.success {
            info!(
                url = %result.url,
                job_links_found = result.job_links_found,
                jobs_found = result.jobs_found,
                jobs_rejected = result.jobs_rejected,
                jobs_stored = result.jobs_stored,
                "Career page crawl completed"
            );
        } else {
            warn!(
                url = %result.url,
                state = ?result.final_state,
                jobs_found = result.jobs_found,
                "Career page crawl failed"
            );
        }

        result
    }

    async fn crawl(
        &self,
        ctx: &WorkflowContext,
        request: &CareerPageCrawlRequest,
        started_at: DateTime<Utc>,
        result: &mut CareerPageCrawlResult,
    ) -> Result<(), String> {
        let deps = &self.deps;
        let settings = &deps.settings;
        let url = request.url.as_str();

        let page = ctx
            .run("fetch_career_page", TaskOptions::crawl(), move || async move {
                activities::fetch_page(url, deps).await.map_err(classify_error)
            })
            .await
            .map_err(|e| failure_reason(&e, "fetch failed"))?;
        result.final_state = CrawlState::PageFetched;

        let html = page.html.as_str();
        let links = ctx
            .run("extract_job_links", TaskOptions::crawl(), move || async move {
                activities::extract_job_links(url, html, deps)
                    .await
                    .map_err(classify_error)
            })
            .await
            .map_err(|e| failure_reason(&e, "link extraction failed"))?;
        result.final_state = CrawlState::LinksExtracted;
        result.job_links_found = links.len();

        if links.is_empty() {
            info!(url = %url, "No job links on career page");
            return Ok(());
        }

        let retained: Vec<JobLink> = links.into_iter().take(settings.max_job_links).collect();
        result.job_links_crawled = retained.len();

        let company = request.company_name.as_str();
        let this = self;
        let parsed: Vec<ParsedJob> = ctx
            .fan_out(
                "job_links",
                retained,
                settings.job_fetch_concurrency,
                move |branch, link| async move { this.crawl_job_link(&branch, link, company).await },
            )
            .await
            .into_iter()
            .flatten()
            .collect();
        result.final_state = CrawlState::JobsCrawled;
        result.jobs_found = parsed.len();

        if ctx.is_cancelled() {
            return Err(CANCELLED.to_string());
        }

        let scored: Vec<(ParsedJob, i32)> = ctx
            .fan_out(
                "score_jobs",
                parsed,
                settings.job_fetch_concurrency,
                move |branch, job| async move { this.resolve_score(&branch, job).await },
            )
            .await;
        result.final_state = CrawlState::JobsParsed;

        let version = started_at.timestamp_millis();
        let jobs: Vec<Job> = scored
            .into_iter()
            .map(|(job, score)| Job::from_parsed(job, score, version))
            .collect();

        let gate = QualityGate::new(settings.min_quality_score);
        let (admitted, rejected) = gate.partition(jobs);
        result.jobs_rejected = rejected.len();

        for job in &rejected {
            debug!(
                title = %job.title,
                score = job.quality_score,
                threshold = gate.threshold(),
                "Job rejected by quality gate"
            );
        }

        if admitted.is_empty() {
            result.final_state = CrawlState::Stored;
            return Ok(());
        }

        if ctx.is_cancelled() {
            return Err(CANCELLED.to_string());
        }

        let admitted = &admitted;
        result.jobs_stored = ctx
            .run("persist_jobs", TaskOptions::database(), move || async move {
                activities::store_jobs(admitted, deps)
                    .await
                    .map_err(classify_error)
            })
            .await
            .map_err(|e| failure_reason(&e, "store failed"))?;
        result.final_state = CrawlState::Stored;

        Ok(())
    }

    /// Fetch and parse one job page. Any failure skips the link.
    async fn crawl_job_link(
        &self,
        ctx: &WorkflowContext,
        link: JobLink,
        company: &str,
    ) -> Option<ParsedJob> {
        let deps = &self.deps;
        let url = link.url.as_str();

        let page = match ctx
            .run("fetch_job_page", TaskOptions::crawl(), move || async move {
                activities::fetch_page(url, deps).await.map_err(classify_error)
            })
            .await
        {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %url, error = %e, "Job page fetch failed, skipping link");
                return None;
            }
        };

        let html = page.html.as_str();
        match ctx
            .run("parse_job", TaskOptions::crawl(), move || async move {
                activities::parse_job(url, html, deps).await.map_err(classify_error)
            })
            .await
        {
            Ok(ParseOutcome::Parsed(job)) => Some(job.normalize(url, company)),
            Ok(ParseOutcome::NotParseable) => {
                debug!(url = %url, "No structured job on page");
                None
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Job parse failed, skipping link");
                None
            }
        }
    }

    /// Parser-supplied score, else the scoring service. A scoring failure
    /// yields 0 so the gate rejects the job.
    async fn resolve_score(&self, ctx: &WorkflowContext, job: ParsedJob) -> (ParsedJob, i32) {
        if let Some(score) = job.quality_score {
            return (job, score);
        }

        let deps = &self.deps;
        let posting = &job;
        let score = match ctx
            .run("score_job", TaskOptions::crawl(), move || async move {
                activities::score_job(posting, deps).await.map_err(classify_error)
            })
            .await
        {
            Ok(score) => score,
            Err(e) => {
                warn!(title = %job.title, error = %e, "Job scoring failed, scoring as 0");
                0
            }
        };

        (job, score)
    }
}

const CANCELLED: &str = "cancelled";

fn failure_reason(error: &WorkflowError, reason: &str) -> String {
    if error.is_cancelled() {
        return CANCELLED.to_string();
    }
    warn!(error = %error, reason, "Crawl step failed");
    reason.to_string()
}
