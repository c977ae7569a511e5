//! Discovery domain activities
//!
//! Thin, side-effecting steps around the OSINT collaborator and the store.
//! Workflows call these inside journaled tasks.

pub mod detect_platform;
pub mod discover_companies;
pub mod discover_urls;
pub mod search_dork;
pub mod staleness;
pub mod store;

pub use detect_platform::detect_platform;
pub use discover_companies::discover_companies;
pub use discover_urls::{discover_career_pages, enumerate_subdomains};
pub use search_dork::search_dork;
pub use staleness::{get_stale_companies, touch_company};
pub use store::{store_companies, store_urls};
