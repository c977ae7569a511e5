// Common utilities shared across the discovery and crawling domains

pub mod utils;

pub use utils::*;
