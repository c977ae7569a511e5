// Career Discovery Pipeline - Core
//
// This crate discovers companies and their job pages, crawls those pages and
// stores gated, deduplicated job records. Architecture follows domain-driven
// design with durable execution via the `durable` crate.
//
// Workflows are organized per-domain in domains/*/workflows/

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
