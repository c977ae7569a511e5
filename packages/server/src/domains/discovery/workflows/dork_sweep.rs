//! Dork sweep workflow
//!
//! Finds job boards for a keyword through search-engine dorks:
//! 1. Generate the dork queries for the keyword
//! 2. Run every query in parallel
//! 3. Detect the ATS platform of every result URL
//! 4. Queue the URLs as ATS-detected pages

use std::collections::BTreeMap;
use std::time::Duration;

use durable::{TaskOptions, WorkflowContext, WorkflowError, UNBOUNDED};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::company_discovery::elapsed;
use crate::common::extract_domain;
use crate::domains::discovery::activities;
use crate::domains::discovery::dork::generate_dork_queries;
use crate::domains::discovery::models::{PlatformDetection, UrlCandidate};
use crate::kernel::http::classify_error;
use crate::kernel::ServerDeps;

/// Default number of search results requested per dork query.
pub const DEFAULT_RESULTS_PER_QUERY: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DorkSweepRequest {
    pub keyword: String,
    pub results_per_query: usize,
}

impl DorkSweepRequest {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            results_per_query: DEFAULT_RESULTS_PER_QUERY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DorkSweepResult {
    pub queries_run: usize,
    pub urls_found: usize,
    pub urls_queued: usize,
    pub platforms: BTreeMap<String, usize>,
    pub cancelled: bool,
    pub duration: Duration,
}

pub struct DorkSweepWorkflow {
    pub deps: ServerDeps,
}

impl DorkSweepWorkflow {
    pub fn new(deps: ServerDeps) -> Self {
        Self { deps }
    }

    pub async fn run(
        &self,
        ctx: &WorkflowContext,
        request: DorkSweepRequest,
    ) -> Result<DorkSweepResult, WorkflowError> {
        info!(keyword = %request.keyword, "Starting dork sweep workflow");

        let started_at = ctx.now().await?;
        let deps = &self.deps;
        let max_results = request.results_per_query;

        let queries = generate_dork_queries(&request.keyword);
        let mut result = DorkSweepResult {
            queries_run: queries.len(),
            ..Default::default()
        };

        let urls: Vec<String> = ctx
            .fan_out("dork_queries", queries, UNBOUNDED, move |branch, query| async move {
                let q = query.as_str();
                branch
                    .run("search_dork", TaskOptions::discovery(), move || async move {
                        activities::search_dork(q, max_results, deps)
                            .await
                            .map_err(classify_error)
                    })
                    .await
                    .unwrap_or_else(|e| {
                        warn!(query = %query, error = %e, "Dork query failed");
                        Vec::new()
                    })
            })
            .await
            .into_iter()
            .flatten()
            .collect();
        result.urls_found = urls.len();

        let detections: Vec<PlatformDetection> = ctx
            .fan_out(
                "detect_platforms",
                urls.clone(),
                deps.settings.discovery_concurrency,
                move |branch, url| async move {
                    let u = url.as_str();
                    branch
                        .run("detect_platform", TaskOptions::discovery(), move || async move {
                            activities::detect_platform(u, deps)
                                .await
                                .map_err(classify_error)
                        })
                        .await
                        .unwrap_or_else(|e| {
                            warn!(url = %url, error = %e, "Platform detection failed");
                            PlatformDetection::default()
                        })
                },
            )
            .await;

        let mut candidates = Vec::with_capacity(urls.len());
        for (url, detection) in urls.into_iter().zip(detections) {
            let Some(domain) = extract_domain(&url) else {
                warn!(url = %url, "Skipping dork result without a domain");
                continue;
            };
            let platform = detection.platform_name().map(str::to_string);
            if let Some(name) = &platform {
                *result.platforms.entry(name.clone()).or_default() += 1;
            }
            candidates.push(UrlCandidate::ats_board(url, domain, platform, detection.confidence));
        }

        if !candidates.is_empty() {
            let candidates = &candidates;
            result.urls_queued = ctx
                .run("store_urls", TaskOptions::database(), move || async move {
                    activities::store_urls(candidates, deps)
                        .await
                        .map_err(classify_error)
                })
                .await
                .unwrap_or_else(|e| {
                    warn!(count = candidates.len(), error = %e, "Failed to queue dork results");
                    0
                });
        }

        result.cancelled = ctx.is_cancelled();
        result.duration = elapsed(ctx, started_at).await;

        info!(
            keyword = %request.keyword,
            queries_run = result.queries_run,
            urls_found = result.urls_found,
            urls_queued = result.urls_queued,
            platforms = ?result.platforms,
            "Dork sweep workflow completed"
        );

        Ok(result)
    }
}
