//! Shared fixtures and the Postgres harness for integration tests.

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::*;
