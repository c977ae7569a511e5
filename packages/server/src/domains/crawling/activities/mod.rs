//! Crawling domain activities
//!
//! Side-effecting steps of the career-page crawl. Each one is invoked by the
//! workflow inside a journaled task.

pub mod fetch_page;
pub mod parse_job;
pub mod score_job;
pub mod store_jobs;

pub use fetch_page::fetch_page;
pub use parse_job::{extract_job_links, parse_job};
pub use score_job::score_job;
pub use store_jobs::store_jobs;
