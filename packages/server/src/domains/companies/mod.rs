//! Companies domain - the discovered-company registry.
//!
//! A company is created the first time any discovery source reports its
//! domain. Continuous discovery re-visits companies whose
//! `last_discovered_at` falls outside the staleness window.

pub mod models;

pub use models::{Company, CompanyCandidate, DiscoverySource};
