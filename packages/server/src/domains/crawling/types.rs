//! Types shared by the career-page crawl activities and workflow.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domains::jobs::ParsedJob;

/// Rendered page returned by the crawler service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedPage {
    pub url: String,
    pub html: String,
    pub status: u16,
}

/// Link to an individual posting found on a career page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobLink {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl JobLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
        }
    }
}

/// Result of asking the parser for a structured posting.
///
/// `NotParseable` is a normal outcome (no structured data on the page), not
/// an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "job", rename_all = "snake_case")]
pub enum ParseOutcome {
    Parsed(ParsedJob),
    NotParseable,
}

/// Progress of a single career-page crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum CrawlState {
    Start,
    PageFetched,
    LinksExtracted,
    JobsCrawled,
    JobsParsed,
    Stored,
    Done,
    Failed(String),
}

impl CrawlState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CrawlState::Done | CrawlState::Failed(_))
    }
}

/// Input to the career-page crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerPageCrawlRequest {
    pub url: String,
    /// Display name used when the parser does not report a company.
    pub company_name: String,
}

impl CareerPageCrawlRequest {
    pub fn new(url: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            company_name: company_name.into(),
        }
    }
}

/// Outcome of one career-page crawl. Always returned, even on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerPageCrawlResult {
    pub url: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub final_state: CrawlState,
    /// Links the parser found on the career page.
    pub job_links_found: usize,
    /// Links actually fetched after applying the link cap.
    pub job_links_crawled: usize,
    /// Job pages that parsed into a structured posting.
    pub jobs_found: usize,
    /// Parsed postings dropped by the quality gate.
    pub jobs_rejected: usize,
    pub jobs_stored: usize,
    pub duration: Duration,
}

impl CareerPageCrawlResult {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            success: false,
            error_message: None,
            final_state: CrawlState::Start,
            job_links_found: 0,
            job_links_crawled: 0,
            jobs_found: 0,
            jobs_rejected: 0,
            jobs_stored: 0,
            duration: Duration::ZERO,
        }
    }

    pub(crate) fn finish(&mut self, outcome: Result<(), String>) {
        match outcome {
            Ok(()) => {
                self.success = true;
                self.final_state = CrawlState::Done;
            }
            Err(reason) => {
                self.success = false;
                self.error_message = Some(reason.clone());
                self.final_state = CrawlState::Failed(reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_failure_records_reason() {
        let mut result = CareerPageCrawlResult::new("https://acme.com/careers");
        result.final_state = CrawlState::LinksExtracted;
        result.finish(Err("store failed".to_string()));

        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("store failed"));
        assert_eq!(result.final_state, CrawlState::Failed("store failed".to_string()));
        assert!(result.final_state.is_terminal());
    }

    #[test]
    fn parse_outcome_serializes_tagged() {
        let json = serde_json::to_value(ParseOutcome::NotParseable).unwrap();
        assert_eq!(json, serde_json::json!({"outcome": "not_parseable"}));
    }
}
