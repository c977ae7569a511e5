//! Server dependencies for workflows (using traits for testability)
//!
//! This module provides the central dependency container used by all domain
//! activities. All external services use trait abstractions to enable testing.

use std::sync::Arc;

use anyhow::Result;
use durable::Journal;
use sqlx::PgPool;

use crate::config::{Config, WorkflowSettings};
use crate::kernel::{
    BaseJobParser, BaseJobScorer, BaseOsintClient, BasePageFetcher, BaseProxyProvider, BaseStore,
    CrawlerClient, NoopProxyProvider, OsintClient, ParserClient, PostgresJournal, PostgresStore,
    ProxyManagerClient, RealScoreClient,
};

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to activities (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn BaseStore>,
    pub osint: Arc<dyn BaseOsintClient>,
    pub page_fetcher: Arc<dyn BasePageFetcher>,
    pub job_parser: Arc<dyn BaseJobParser>,
    pub job_scorer: Arc<dyn BaseJobScorer>,
    /// Proxy rotation for page fetches. `NoopProxyProvider` when unconfigured.
    pub proxies: Arc<dyn BaseProxyProvider>,
    /// Step journal backing every workflow run started from these deps.
    pub journal: Arc<dyn Journal>,
    pub settings: WorkflowSettings,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn BaseStore>,
        osint: Arc<dyn BaseOsintClient>,
        page_fetcher: Arc<dyn BasePageFetcher>,
        job_parser: Arc<dyn BaseJobParser>,
        job_scorer: Arc<dyn BaseJobScorer>,
        proxies: Arc<dyn BaseProxyProvider>,
        journal: Arc<dyn Journal>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            store,
            osint,
            page_fetcher,
            job_parser,
            job_scorer,
            proxies,
            journal,
            settings,
        }
    }

    /// Wire the production HTTP clients and Postgres adapters.
    pub fn from_config(config: &Config, pool: PgPool) -> Result<Self> {
        let timeout = config.http_timeout;

        let proxies: Arc<dyn BaseProxyProvider> = match &config.proxy_manager_url {
            Some(url) => Arc::new(ProxyManagerClient::new(url.as_str(), timeout)?),
            None => Arc::new(NoopProxyProvider),
        };

        Ok(Self::new(
            Arc::new(PostgresStore::new(pool.clone())),
            Arc::new(OsintClient::new(config.osint_service_url.as_str(), timeout)?),
            Arc::new(CrawlerClient::new(config.crawler_service_url.as_str(), timeout)?),
            Arc::new(ParserClient::new(config.parser_service_url.as_str(), timeout)?),
            Arc::new(RealScoreClient::new(config.realscore_service_url.as_str(), timeout)?),
            proxies,
            Arc::new(PostgresJournal::new(pool)),
            config.workflow.clone(),
        ))
    }
}
