//! Kernel module - server infrastructure and dependencies.

pub mod crawler_client;
pub mod deps;
pub mod http;
pub mod journal;
pub mod osint_client;
pub mod parser_client;
pub mod proxy_client;
pub mod realscore_client;
pub mod scheduled_tasks;
pub mod store;
pub mod test_dependencies;
pub mod traits;

// HTTP clients for the collaborator services
pub use crawler_client::CrawlerClient;
pub use osint_client::OsintClient;
pub use parser_client::ParserClient;
pub use proxy_client::{NoopProxyProvider, ProxyManagerClient};
pub use realscore_client::RealScoreClient;

// Other exports
pub use deps::ServerDeps;
pub use journal::PostgresJournal;
pub use store::PostgresStore;
pub use test_dependencies::TestDependencies;
pub use traits::*;
