//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! Continuous discovery runs on a cron schedule (every 6 hours by default).
//! At most one run is in flight: a tick that fires while the previous run is
//! still going is skipped. Journal entries older than the retention window
//! are pruned after every run.
//!
//! ```text
//! Scheduler (cron)
//!     │
//!     └─► ContinuousDiscoveryWorkflow
//!             ├─► CompanyDiscoveryWorkflow (per stale company + strategies)
//!             │       └─► CareerPageCrawlWorkflow (per discovered URL)
//!             └─► touch_company (per stale company)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use durable::WorkflowContext;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::domains::discovery::workflows::{
    ContinuousDiscoveryRequest, ContinuousDiscoveryResult, ContinuousDiscoveryWorkflow,
};
use crate::kernel::ServerDeps;

/// Start the continuous discovery schedule
pub async fn start_scheduler(
    deps: ServerDeps,
    cron: &str,
    request: ContinuousDiscoveryRequest,
    journal_retention: chrono::Duration,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    let running = Arc::new(AtomicBool::new(false));

    let discovery_job = Job::new_async(cron, move |_uuid, _lock| {
        let deps = deps.clone();
        let request = request.clone();
        let running = running.clone();
        Box::pin(async move {
            let Some(_guard) = RunGuard::acquire(&running) else {
                tracing::warn!("Previous continuous discovery still running, skipping tick");
                return;
            };

            // The job uuid is fixed across ticks; each tick is a new run.
            let workflow_id = format!("continuous-discovery-{}", Uuid::now_v7());
            if let Err(e) = run_continuous_discovery(&deps, request, &workflow_id).await {
                tracing::error!("Continuous discovery task failed: {:#}", e);
            }

            if let Err(e) = prune_journal(&deps, Utc::now() - journal_retention).await {
                tracing::warn!("Journal pruning failed: {:#}", e);
            }
        })
    })?;

    scheduler.add(discovery_job).await?;
    scheduler.start().await?;

    tracing::info!(cron, "Scheduled tasks started (continuous discovery)");
    Ok(scheduler)
}

/// Overlap flag held for the length of one run. Dropping it clears the flag,
/// also when the run panics.
struct RunGuard(Arc<AtomicBool>);

impl RunGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        if flag.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(Self(flag.clone()))
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Delete journal entries recorded before `recorded_before`.
pub async fn prune_journal(deps: &ServerDeps, recorded_before: DateTime<Utc>) -> Result<u64> {
    let pruned = deps
        .journal
        .prune(recorded_before)
        .await
        .context("Failed to prune workflow journal")?;

    tracing::info!(pruned, %recorded_before, "Pruned workflow journal");
    Ok(pruned)
}

/// Run one continuous discovery under `workflow_id`.
///
/// Re-using a workflow id resumes that run: steps already journaled are
/// replayed instead of executed.
pub async fn run_continuous_discovery(
    deps: &ServerDeps,
    request: ContinuousDiscoveryRequest,
    workflow_id: &str,
) -> Result<ContinuousDiscoveryResult> {
    tracing::info!(workflow_id, "Running continuous discovery");

    let ctx = WorkflowContext::new(workflow_id, deps.journal.clone());
    let result = ContinuousDiscoveryWorkflow::new(deps.clone())
        .run(&ctx, request)
        .await?;

    tracing::info!(
        workflow_id,
        stale_companies = result.stale_companies,
        discoveries_failed = result.discoveries_failed,
        jobs_stored = result.jobs_stored,
        "Continuous discovery complete"
    );

    Ok(result)
}
