use anyhow::{Context, Result};
use tracing::info;

use crate::domains::jobs::Job;
use crate::kernel::ServerDeps;

/// Persist gated jobs in one batch. Returns rows written; rows skipped by the
/// version guard are not counted.
pub async fn store_jobs(jobs: &[Job], deps: &ServerDeps) -> Result<usize> {
    let stored = deps
        .store
        .persist_jobs(jobs)
        .await
        .context("Failed to persist jobs")?;

    info!(submitted = jobs.len(), stored, "Stored jobs");
    Ok(stored)
}
