use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{build_client, ensure_success};
use super::BaseJobScorer;
use crate::domains::jobs::ParsedJob;

/// Client for the RealScore authenticity scoring service.
pub struct RealScoreClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    job_title: &'a str,
    job_description: &'a str,
    company: &'a str,
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    score: f64,
}

impl RealScoreClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl BaseJobScorer for RealScoreClient {
    async fn score(&self, job: &ParsedJob) -> Result<i32> {
        let request = ScoreRequest {
            job_title: &job.title,
            job_description: job.description.as_deref().unwrap_or_default(),
            company: job.company.as_deref().unwrap_or_default(),
            url: job.source_url.as_deref().unwrap_or_default(),
        };

        let response = self
            .client
            .post(format!("{}/api/v1/score", self.base_url))
            .json(&request)
            .send()
            .await
            .context("Failed to call RealScore service")?;

        let scored: ScoreResponse = ensure_success("realscore", response)
            .await?
            .json()
            .await
            .context("Failed to parse RealScore response")?;

        Ok(scored.score.round().clamp(0.0, 100.0) as i32)
    }
}
