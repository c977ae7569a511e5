//! Crawling domain - career-page crawling into stored jobs
//!
//! # Components
//!
//! - `activities/` - Side-effecting steps (fetch, parse, score, store)
//! - `workflows/` - `CareerPageCrawlWorkflow`
//! - `quality` - Score threshold applied before storage
//! - `types` - Crawl request/result and collaborator payloads

pub mod activities;
pub mod quality;
pub mod types;
pub mod workflows;

pub use quality::{QualityGate, DEFAULT_MIN_QUALITY_SCORE};
pub use types::*;
pub use workflows::*;
