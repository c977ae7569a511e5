//! Discovery domain - finding companies and the URLs where they post jobs
//!
//! Company discovery fans out over independent OSINT sources, resolves career
//! pages and subdomains per company, detects hosted ATS platforms and queues
//! every URL before crawling it. Continuous discovery re-runs it for stale
//! companies on a schedule; the dork sweep queues ATS boards by keyword.

pub mod activities;
pub mod dork;
pub mod models;
pub mod workflows;

pub use models::{CareerPage, DiscoveredUrl, PageType, PlatformDetection, UrlCandidate};
pub use workflows::*;
