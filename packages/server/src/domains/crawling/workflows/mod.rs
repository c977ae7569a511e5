//! Crawling domain workflows
//!
//! Durable workflows for career-page crawling.

pub mod career_page_crawl;

pub use career_page_crawl::*;
