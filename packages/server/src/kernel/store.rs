//! Postgres-backed storage adapter.
//!
//! Queries live on the models; this type only adapts them to [`BaseStore`].

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::BaseStore;
use crate::domains::companies::{Company, CompanyCandidate};
use crate::domains::discovery::models::{DiscoveredUrl, UrlCandidate};
use crate::domains::jobs::Job;

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseStore for PostgresStore {
    async fn persist_urls(&self, urls: &[UrlCandidate]) -> Result<usize> {
        DiscoveredUrl::upsert_many(urls, &self.pool).await
    }

    async fn persist_jobs(&self, jobs: &[Job]) -> Result<usize> {
        Job::upsert_many(jobs, &self.pool).await
    }

    async fn persist_companies(
        &self,
        companies: &[CompanyCandidate],
        discovered_at: DateTime<Utc>,
    ) -> Result<usize> {
        Company::upsert_many(companies, discovered_at, &self.pool).await
    }

    async fn find_company(&self, domain: &str) -> Result<Option<Company>> {
        Company::find_by_domain(domain, &self.pool).await
    }

    async fn find_stale_companies(&self, cutoff: DateTime<Utc>) -> Result<Vec<Company>> {
        Company::find_stale(cutoff, &self.pool).await
    }

    async fn touch_company_discovered(&self, domain: &str, at: DateTime<Utc>) -> Result<()> {
        Company::touch_discovered(domain, at, &self.pool).await
    }
}
