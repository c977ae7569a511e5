//! Jobs domain - parsed job postings and their dedup/versioning rules.

pub mod models;

pub use models::{Job, ParsedJob};
