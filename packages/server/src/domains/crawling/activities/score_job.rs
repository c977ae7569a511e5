use anyhow::{Context, Result};

use crate::domains::jobs::ParsedJob;
use crate::kernel::ServerDeps;

/// Quality score for a posting the parser did not score, clamped to 0-100.
pub async fn score_job(job: &ParsedJob, deps: &ServerDeps) -> Result<i32> {
    let score = deps
        .job_scorer
        .score(job)
        .await
        .with_context(|| format!("Failed to score job '{}'", job.title))?;

    Ok(score.clamp(0, 100))
}
