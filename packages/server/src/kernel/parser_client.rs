use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::http::{build_client, ensure_success};
use super::BaseJobParser;
use crate::domains::crawling::types::{JobLink, ParseOutcome};
use crate::domains::jobs::ParsedJob;

/// Client for the job parser service.
///
/// `POST /api/v1/parse` answers 422 when the page carries no structured
/// posting, which maps to [`ParseOutcome::NotParseable`].
pub struct ParserClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct PageRequest<'a> {
    url: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExtractLinksResponse {
    #[serde(default)]
    links: Vec<JobLink>,
}

impl ParserClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl BaseJobParser for ParserClient {
    async fn extract_job_links(&self, url: &str, html: &str) -> Result<Vec<JobLink>> {
        let response = self
            .client
            .post(format!("{}/api/v1/extract-links", self.base_url))
            .json(&PageRequest { url, html })
            .send()
            .await
            .context("Failed to call parser service")?;

        let extracted: ExtractLinksResponse = ensure_success("parser", response)
            .await?
            .json()
            .await
            .context("Failed to parse extract-links response")?;

        Ok(extracted.links)
    }

    async fn parse_job(&self, url: &str, html: &str) -> Result<ParseOutcome> {
        let response = self
            .client
            .post(format!("{}/api/v1/parse", self.base_url))
            .json(&PageRequest { url, html })
            .send()
            .await
            .context("Failed to call parser service")?;

        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            tracing::debug!(url = %url, "No structured job data on page");
            return Ok(ParseOutcome::NotParseable);
        }

        let job: ParsedJob = ensure_success("parser", response)
            .await?
            .json()
            .await
            .context("Failed to parse parser response")?;

        Ok(ParseOutcome::Parsed(job))
    }
}
