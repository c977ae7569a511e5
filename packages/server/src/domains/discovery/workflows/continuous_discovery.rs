//! Continuous discovery workflow
//!
//! Recurring sweep, started by the scheduler:
//! 1. Load companies not re-discovered within the staleness window
//! 2. Re-discover each stale company (child workflow) while stamping it
//! 3. Run the enabled new-company strategies (code host, dorking)
//! 4. Aggregate counts from every child

use std::time::Duration;

use chrono::{DateTime, Utc};
use durable::{TaskOptions, WorkflowContext, WorkflowError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::company_discovery::{
    elapsed, CompanyDiscoveryRequest, CompanyDiscoveryResult, CompanyDiscoveryWorkflow,
};
use crate::domains::companies::DiscoverySource;
use crate::domains::discovery::activities;
use crate::kernel::http::classify_error;
use crate::kernel::ServerDeps;

/// Request bundle handed to every scheduled run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousDiscoveryRequest {
    pub stale_threshold_days: i64,
    pub run_code_host_discovery: bool,
    pub code_host_query: String,
    pub run_dork_discovery: bool,
    pub dork_query: String,
    pub max_new_companies: usize,
}

impl Default for ContinuousDiscoveryRequest {
    fn default() -> Self {
        Self {
            stale_threshold_days: 7,
            run_code_host_discovery: true,
            code_host_query: "tech startup".to_string(),
            run_dork_discovery: true,
            dork_query: "we are hiring software engineer".to_string(),
            max_new_companies: 50,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContinuousDiscoveryResult {
    pub stale_companies: usize,
    pub discoveries_started: usize,
    pub discoveries_succeeded: usize,
    pub discoveries_failed: usize,
    /// Children stopped by cancellation; their partial counts are included.
    pub discoveries_cancelled: usize,
    pub touch_failures: usize,
    pub companies_found: usize,
    pub urls_queued: usize,
    pub crawls_succeeded: usize,
    pub jobs_stored: usize,
    pub cancelled: bool,
    pub duration: Duration,
}

/// One independently failing piece of a sweep.
#[derive(Debug, Clone)]
enum DiscoveryUnit {
    /// Re-discover a stale company and stamp it as discovered.
    Refresh { domain: String },
    /// Look for new companies with one strategy.
    Strategy(CompanyDiscoveryRequest),
}

struct UnitOutcome {
    discovery: Option<CompanyDiscoveryResult>,
    touch_failed: bool,
}

pub struct ContinuousDiscoveryWorkflow {
    pub deps: ServerDeps,
}

impl ContinuousDiscoveryWorkflow {
    pub fn new(deps: ServerDeps) -> Self {
        Self { deps }
    }

    /// Fails only when the stale-company lookup fails; every child failure is
    /// counted instead.
    pub async fn run(
        &self,
        ctx: &WorkflowContext,
        request: ContinuousDiscoveryRequest,
    ) -> Result<ContinuousDiscoveryResult, WorkflowError> {
        info!(
            stale_threshold_days = request.stale_threshold_days,
            code_host = request.run_code_host_discovery,
            dork = request.run_dork_discovery,
            "Starting continuous discovery workflow"
        );

        let started_at = ctx.now().await?;
        let cutoff = started_at - chrono::Duration::days(request.stale_threshold_days);
        let deps = &self.deps;

        let stale = ctx
            .run("get_stale_companies", TaskOptions::long_running(), move || async move {
                activities::get_stale_companies(cutoff, deps)
                    .await
                    .map_err(classify_error)
            })
            .await?;

        let mut result = ContinuousDiscoveryResult {
            stale_companies: stale.len(),
            ..Default::default()
        };

        let units = discovery_units(stale.into_iter().map(|c| c.domain), &request);
        result.discoveries_started = units.len();

        let this = self;
        let outcomes: Vec<UnitOutcome> = ctx
            .fan_out(
                "discoveries",
                units,
                deps.settings.discovery_concurrency,
                move |branch, unit| async move { this.run_unit(&branch, unit, started_at).await },
            )
            .await;

        for outcome in outcomes {
            if outcome.touch_failed {
                result.touch_failures += 1;
            }
            match outcome.discovery {
                Some(discovery) => {
                    if discovery.cancelled {
                        result.discoveries_cancelled += 1;
                    } else {
                        result.discoveries_succeeded += 1;
                    }
                    result.companies_found += discovery.companies_found;
                    result.urls_queued += discovery.urls_queued;
                    result.crawls_succeeded += discovery.crawls_succeeded;
                    result.jobs_stored += discovery.jobs_stored;
                }
                None => result.discoveries_failed += 1,
            }
        }

        result.cancelled = ctx.is_cancelled();
        result.duration = elapsed(ctx, started_at).await;

        info!(
            cancelled = result.cancelled,
            stale_companies = result.stale_companies,
            discoveries_succeeded = result.discoveries_succeeded,
            discoveries_failed = result.discoveries_failed,
            companies_found = result.companies_found,
            urls_queued = result.urls_queued,
            jobs_stored = result.jobs_stored,
            "Continuous discovery workflow completed"
        );

        Ok(result)
    }

    async fn run_unit(
        &self,
        ctx: &WorkflowContext,
        unit: DiscoveryUnit,
        started_at: DateTime<Utc>,
    ) -> UnitOutcome {
        match unit {
            DiscoveryUnit::Refresh { domain } => {
                let deps = &self.deps;
                let domain = domain.as_str();

                let child = ctx.child("company_discovery");
                let discovery = self.discover(&child, CompanyDiscoveryRequest::seed(domain));
                let touch = ctx.run("touch_company", TaskOptions::database(), move || async move {
                    activities::touch_company(domain, started_at, deps)
                        .await
                        .map_err(classify_error)
                });

                let (discovery, touch) = futures::join!(discovery, touch);

                let touch_failed = match touch {
                    Ok(()) => false,
                    Err(e) => {
                        warn!(domain, error = %e, "Failed to stamp company as discovered");
                        true
                    }
                };

                UnitOutcome {
                    discovery,
                    touch_failed,
                }
            }
            DiscoveryUnit::Strategy(request) => {
                let child = ctx.child("company_discovery");
                UnitOutcome {
                    discovery: self.discover(&child, request).await,
                    touch_failed: false,
                }
            }
        }
    }

    async fn discover(
        &self,
        ctx: &WorkflowContext,
        request: CompanyDiscoveryRequest,
    ) -> Option<CompanyDiscoveryResult> {
        let query = request.query.clone();
        match CompanyDiscoveryWorkflow::new(self.deps.clone())
            .run(ctx, request)
            .await
        {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(query = %query, error = %e, "Company discovery failed");
                None
            }
        }
    }
}

/// Refresh units for stale domains, in order, then the enabled strategies.
fn discovery_units(
    stale_domains: impl Iterator<Item = String>,
    request: &ContinuousDiscoveryRequest,
) -> Vec<DiscoveryUnit> {
    let mut units: Vec<DiscoveryUnit> = stale_domains
        .map(|domain| DiscoveryUnit::Refresh { domain })
        .collect();

    if request.run_code_host_discovery {
        units.push(DiscoveryUnit::Strategy(CompanyDiscoveryRequest::new(
            request.code_host_query.as_str(),
            vec![DiscoverySource::CodeHost],
            request.max_new_companies,
        )));
    }

    if request.run_dork_discovery {
        units.push(DiscoveryUnit::Strategy(CompanyDiscoveryRequest::new(
            request.dork_query.as_str(),
            vec![DiscoverySource::SearchDork],
            request.max_new_companies,
        )));
    }

    units
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_follow_enabled_strategies() {
        let request = ContinuousDiscoveryRequest {
            run_dork_discovery: false,
            ..Default::default()
        };

        let units = discovery_units(vec!["acme.com".to_string()].into_iter(), &request);

        assert_eq!(units.len(), 2);
        assert!(matches!(&units[0], DiscoveryUnit::Refresh { domain } if domain == "acme.com"));
        match &units[1] {
            DiscoveryUnit::Strategy(req) => {
                assert_eq!(req.sources, vec![DiscoverySource::CodeHost]);
                assert_eq!(req.query, "tech startup");
                assert_eq!(req.max_results, 50);
            }
            other => panic!("unexpected unit {:?}", other),
        }
    }

    #[test]
    fn stale_refresh_uses_manual_seed() {
        let request = CompanyDiscoveryRequest::seed("acme.com");
        assert_eq!(request.sources, vec![DiscoverySource::Manual]);
        assert_eq!(request.max_results, 10);
    }
}
