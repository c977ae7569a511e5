// Business domains
pub mod companies;
pub mod crawling;
pub mod discovery;
pub mod jobs;
